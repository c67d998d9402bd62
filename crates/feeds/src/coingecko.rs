//! CoinGecko REST API client.
//!
//! Fetches token prices and market data from the public CoinGecko API.

use crate::error::FeedError;
use crate::limiter::RateLimiter;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Spot price observation for one token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenPrice {
    pub price: Option<f64>,
    pub change_24h: Option<f64>,
    pub market_cap: Option<f64>,
}

/// CoinGecko API client with request rate limiting.
///
/// The free tier is limited to roughly 30 requests per minute; a demo API
/// key raises the limit and is sent via the `x-cg-demo-api-key` header.
#[derive(Debug)]
pub struct CoinGeckoClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    limiter: RateLimiter,
    rate_limit_cooldown: Duration,
}

impl CoinGeckoClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
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
            api_key,
            client,
            limiter: RateLimiter::per_minute(requests_per_minute),
            rate_limit_cooldown,
        })
    }

    /// Current USD price, 24h change and market cap for a coin id.
    pub async fn token_price(&self, coin_id: &str) -> Result<TokenPrice, FeedError> {
        let endpoint = format!(
            "/simple/price?ids={coin_id}&vs_currencies=usd\
             &include_24hr_change=true&include_market_cap=true"
        );
        let body = self.get_json(&endpoint).await?;
        parse_simple_price(&body, coin_id)
            .ok_or_else(|| FeedError::MissingData(format!("no price entry for {coin_id}")))
    }

    /// Rate-limited GET returning the parsed JSON body.
    ///
    /// A 429 response triggers exactly one cooldown-and-retry; a second 429
    /// surfaces as [`FeedError::RateLimitExceeded`].
    async fn get_json(&self, endpoint: &str) -> Result<Value, FeedError> {
        let url = format!("{}{}", self.base_url, endpoint);

        self.limiter.acquire().await;
        let response = self.send(&url).await?;

        let response = if response.status().as_u16() == 429 {
            warn!(
                cooldown_secs = self.rate_limit_cooldown.as_secs(),
                "CoinGecko rate limit hit, cooling down before retry"
            );
            tokio::time::sleep(self.rate_limit_cooldown).await;
            self.limiter.acquire().await;
            let retried = self.send(&url).await?;
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

        debug!(endpoint, "CoinGecko request ok");
        Ok(response.json().await?)
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }
        request.send().await
    }
}

/// Parse a `/simple/price` response. None if the coin id is absent.
fn parse_simple_price(v: &Value, coin_id: &str) -> Option<TokenPrice> {
    let entry = v.get(coin_id)?;
    Some(TokenPrice {
        price: entry.get("usd").and_then(Value::as_f64),
        change_24h: entry.get("usd_24h_change").and_then(Value::as_f64),
        market_cap: entry.get("usd_market_cap").and_then(Value::as_f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_simple_price() {
        let body = json!({
            "aave": {
                "usd": 182.44,
                "usd_24h_change": -1.2,
                "usd_market_cap": 2_700_000_000.0,
            }
        });
        let parsed = parse_simple_price(&body, "aave").unwrap();
        assert_eq!(parsed.price, Some(182.44));
        assert_eq!(parsed.change_24h, Some(-1.2));
        assert_eq!(parsed.market_cap, Some(2_700_000_000.0));
    }

    #[test]
    fn test_parse_simple_price_unknown_coin() {
        let body = json!({"aave": {"usd": 182.44}});
        assert_eq!(parse_simple_price(&body, "lido-dao"), None);
    }

    #[test]
    fn test_parse_simple_price_partial_fields() {
        let body = json!({"eigenlayer": {"usd": 3.1}});
        let parsed = parse_simple_price(&body, "eigenlayer").unwrap();
        assert_eq!(parsed.price, Some(3.1));
        assert_eq!(parsed.change_24h, None);
        assert_eq!(parsed.market_cap, None);
    }
}
