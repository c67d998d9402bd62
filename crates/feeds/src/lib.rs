//! REST data feeds for DeFi protocol monitoring.
//!
//! This crate provides:
//! - Rate-limited clients for the DefiLlama and CoinGecko public APIs
//! - A snapshot fetcher that combines both into one observation per protocol

pub mod coingecko;
pub mod defillama;
pub mod error;
pub mod fetcher;
pub mod limiter;

pub use coingecko::{CoinGeckoClient, TokenPrice};
pub use defillama::{DefiLlamaClient, ProtocolTvl};
pub use error::FeedError;
pub use fetcher::{FetchConfig, SnapshotFetcher};
pub use limiter::RateLimiter;
