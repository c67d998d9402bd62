//! Point-in-time protocol observations.

use crate::ProtocolSpec;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One protocol's observed state at a point in time.
///
/// Every metric is optional: an upstream that was unreachable or that does
/// not track the metric yields `None`, never zero. A snapshot with all
/// metrics absent plus an `error` description is how a failed fetch travels
/// through the pipeline without aborting the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stable protocol identifier, join key between consecutive polls
    pub protocol_id: CompactString,
    /// Display name
    pub name: String,
    /// Token price in USD
    pub price_usd: Option<f64>,
    /// Total value locked in USD
    pub tvl_usd: Option<f64>,
    /// Mean pool APY in percent
    pub apy_pct: Option<f64>,
    /// Token market cap in USD
    pub market_cap_usd: Option<f64>,
    /// 24h token price change in percent, as reported upstream
    pub price_change_24h_pct: Option<f64>,
    /// 24h TVL change in percent, as reported upstream
    pub tvl_change_24h_pct: Option<f64>,
    /// Observation time, milliseconds since the Unix epoch
    pub observed_at_ms: u64,
    /// Upstream error description if any fetch failed
    pub error: Option<String>,
}

impl Snapshot {
    /// Create an empty snapshot for a protocol, all metrics unknown.
    pub fn empty(spec: &ProtocolSpec) -> Self {
        Self {
            protocol_id: spec.id.clone(),
            name: spec.name.clone(),
            price_usd: None,
            tvl_usd: None,
            apy_pct: None,
            market_cap_usd: None,
            price_change_24h_pct: None,
            tvl_change_24h_pct: None,
            observed_at_ms: crate::now_ms(),
            error: None,
        }
    }

    /// Create a snapshot representing a failed fetch: all metrics absent
    /// plus the error description.
    pub fn errored(spec: &ProtocolSpec, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(spec)
        }
    }

    /// True if at least one metric was observed.
    pub fn has_data(&self) -> bool {
        self.price_usd.is_some() || self.tvl_usd.is_some() || self.apy_pct.is_some()
    }
}
