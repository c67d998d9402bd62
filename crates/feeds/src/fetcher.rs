//! Snapshot fetcher combining all upstream data sources.

use crate::coingecko::CoinGeckoClient;
use crate::defillama::DefiLlamaClient;
use crate::error::FeedError;
use defiwatch_core::{ProtocolSpec, Snapshot};
use std::time::Duration;
use tracing::{info, warn};

/// Upstream API configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// DefiLlama base URL override
    pub defillama_base_url: Option<String>,
    /// CoinGecko base URL override
    pub coingecko_base_url: Option<String>,
    /// Optional CoinGecko demo API key
    pub coingecko_api_key: Option<String>,
    /// DefiLlama requests per minute
    pub defillama_rate_limit: u32,
    /// CoinGecko requests per minute
    pub coingecko_rate_limit: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Sleep before the single retry after a 429 response
    pub rate_limit_cooldown: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            defillama_base_url: None,
            coingecko_base_url: None,
            coingecko_api_key: None,
            defillama_rate_limit: 100,
            coingecko_rate_limit: 30,
            request_timeout: Duration::from_secs(30),
            rate_limit_cooldown: Duration::from_secs(60),
        }
    }
}

/// Produces one snapshot per tracked protocol per poll cycle.
///
/// Individual upstream failures degrade the affected snapshot fields to
/// absent and attach an error description; they never abort the batch.
#[derive(Debug)]
pub struct SnapshotFetcher {
    defillama: DefiLlamaClient,
    coingecko: CoinGeckoClient,
}

impl SnapshotFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FeedError> {
        let defillama = DefiLlamaClient::new(
            config.defillama_base_url,
            config.defillama_rate_limit,
            config.request_timeout,
            config.rate_limit_cooldown,
        )?;
        let coingecko = CoinGeckoClient::new(
            config.coingecko_base_url,
            config.coingecko_api_key,
            config.coingecko_rate_limit,
            config.request_timeout,
            config.rate_limit_cooldown,
        )?;
        Ok(Self { defillama, coingecko })
    }

    /// Fetch snapshots for all protocols, in input order.
    pub async fn fetch_all(&self, protocols: &[ProtocolSpec]) -> Vec<Snapshot> {
        let mut snapshots = Vec::with_capacity(protocols.len());
        for spec in protocols {
            snapshots.push(self.fetch_protocol(spec).await);
        }
        snapshots
    }

    /// Fetch one protocol's snapshot, degrading on upstream failure.
    pub async fn fetch_protocol(&self, spec: &ProtocolSpec) -> Snapshot {
        info!(protocol = %spec.id, "fetching protocol data");
        let mut snapshot = Snapshot::empty(spec);

        if let Some(slug) = &spec.defillama_slug {
            match self.defillama.protocol_tvl(slug).await {
                Ok(tvl) => {
                    snapshot.tvl_usd = tvl.tvl;
                    snapshot.tvl_change_24h_pct = tvl.change_24h;
                }
                Err(e) => {
                    warn!(protocol = %spec.id, error = %e, "TVL fetch failed");
                    snapshot.error = Some(e.to_string());
                }
            }

            match self.defillama.protocol_apy(slug).await {
                Ok(apy) => snapshot.apy_pct = apy,
                // APY is best-effort; a failure is not a snapshot error
                Err(e) => warn!(protocol = %spec.id, error = %e, "APY fetch failed"),
            }
        }

        if let Some(coin_id) = &spec.coingecko_id {
            match self.coingecko.token_price(coin_id).await {
                Ok(price) => {
                    snapshot.price_usd = price.price;
                    snapshot.price_change_24h_pct = price.change_24h;
                    snapshot.market_cap_usd = price.market_cap;
                }
                Err(e) => {
                    warn!(protocol = %spec.id, error = %e, "price fetch failed");
                    snapshot.error = Some(e.to_string());
                }
            }
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_free_tiers() {
        let config = FetchConfig::default();
        assert_eq!(config.defillama_rate_limit, 100);
        assert_eq!(config.coingecko_rate_limit, 30);
        assert_eq!(config.rate_limit_cooldown, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_degrades_not_panics() {
        let fetcher = SnapshotFetcher::new(FetchConfig {
            // nothing listens here; both fetches fail fast
            defillama_base_url: Some("http://127.0.0.1:9".to_string()),
            coingecko_base_url: Some("http://127.0.0.1:9".to_string()),
            defillama_rate_limit: 60_000,
            coingecko_rate_limit: 60_000,
            request_timeout: Duration::from_millis(500),
            ..FetchConfig::default()
        })
        .unwrap();

        let snapshot = fetcher.fetch_protocol(&ProtocolSpec::aave()).await;
        assert_eq!(snapshot.protocol_id, "aave");
        assert!(!snapshot.has_data());
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn test_batch_survives_per_protocol_failures() {
        let fetcher = SnapshotFetcher::new(FetchConfig {
            defillama_base_url: Some("http://127.0.0.1:9".to_string()),
            coingecko_base_url: Some("http://127.0.0.1:9".to_string()),
            defillama_rate_limit: 60_000,
            coingecko_rate_limit: 60_000,
            request_timeout: Duration::from_millis(500),
            ..FetchConfig::default()
        })
        .unwrap();

        let protocols = ProtocolSpec::default_registry();
        let snapshots = fetcher.fetch_all(&protocols).await;
        assert_eq!(snapshots.len(), protocols.len());
        for (spec, snap) in protocols.iter().zip(&snapshots) {
            assert_eq!(snap.protocol_id, spec.id);
        }
    }
}
