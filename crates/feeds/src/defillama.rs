//! DefiLlama REST API client.
//!
//! Fetches protocol TVL and pool yield data from the public DefiLlama API.

use crate::error::FeedError;
use crate::limiter::RateLimiter;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.llama.fi";

/// TVL observation for one protocol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtocolTvl {
    pub tvl: Option<f64>,
    pub change_1h: Option<f64>,
    pub change_24h: Option<f64>,
    pub change_7d: Option<f64>,
}

/// DefiLlama API client with request rate limiting.
#[derive(Debug)]
pub struct DefiLlamaClient {
    base_url: String,
    client: reqwest::Client,
    limiter: RateLimiter,
    rate_limit_cooldown: Duration,
}

impl DefiLlamaClient {
    pub fn new(
        base_url: Option<String>,
        requests_per_minute: u32,
        request_timeout: Duration,
        rate_limit_cooldown: Duration,
    ) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent("defiwatch/0.1")
            .build()?;

        Ok(Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
            limiter: RateLimiter::per_minute(requests_per_minute),
            rate_limit_cooldown,
        })
    }

    /// Current TVL plus upstream-reported change percentages for a protocol.
    pub async fn protocol_tvl(&self, slug: &str) -> Result<ProtocolTvl, FeedError> {
        let body = self.get_json(&format!("/protocol/{slug}")).await?;
        parse_protocol_tvl(&body)
            .ok_or_else(|| FeedError::MissingData(format!("no tvl field for {slug}")))
    }

    /// Mean APY across the protocol's yield pools, None if it has none.
    pub async fn protocol_apy(&self, slug: &str) -> Result<Option<f64>, FeedError> {
        let body = self.get_json("/yields").await?;
        Ok(parse_mean_apy(&body, slug))
    }

    /// Rate-limited GET returning the parsed JSON body.
    ///
    /// A 429 response triggers exactly one cooldown-and-retry; a second 429
    /// surfaces as [`FeedError::RateLimitExceeded`].
    async fn get_json(&self, endpoint: &str) -> Result<Value, FeedError> {
        let url = format!("{}{}", self.base_url, endpoint);

        self.limiter.acquire().await;
        let response = self.client.get(&url).send().await?;

        let response = if response.status().as_u16() == 429 {
            warn!(
                endpoint,
                cooldown_secs = self.rate_limit_cooldown.as_secs(),
                "DefiLlama rate limit hit, cooling down before retry"
            );
            tokio::time::sleep(self.rate_limit_cooldown).await;
            self.limiter.acquire().await;
            let retried = self.client.get(&url).send().await?;
            if retried.status().as_u16() == 429 {
                return Err(FeedError::RateLimitExceeded);
            }
            retried
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        debug!(endpoint, "DefiLlama request ok");
        Ok(response.json().await?)
    }
}

/// Parse the `/protocol/{slug}` response. None if no `tvl` field at all.
fn parse_protocol_tvl(v: &Value) -> Option<ProtocolTvl> {
    v.get("tvl")?;
    Some(ProtocolTvl {
        tvl: v.get("tvl").and_then(Value::as_f64),
        change_1h: v.get("change_1h").and_then(Value::as_f64),
        change_24h: v.get("change_24h").and_then(Value::as_f64),
        change_7d: v.get("change_7d").and_then(Value::as_f64),
    })
}

/// Mean APY over the `/yields` pools belonging to `slug`.
/// Pools without a positive `apy` value are ignored.
fn parse_mean_apy(v: &Value, slug: &str) -> Option<f64> {
    let pools = v.get("data")?.as_array()?;
    let apys: Vec<f64> = pools
        .iter()
        .filter(|pool| pool.get("project").and_then(Value::as_str) == Some(slug))
        .filter_map(|pool| pool.get("apy").and_then(Value::as_f64))
        .filter(|apy| *apy > 0.0)
        .collect();

    if apys.is_empty() {
        None
    } else {
        Some(apys.iter().sum::<f64>() / apys.len() as f64)
    }
}
