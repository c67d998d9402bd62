//! Alert channel abstraction.

use async_trait::async_trait;
use defiwatch_core::AlertEvent;
use std::time::Duration;
use thiserror::Error;

/// Errors a delivery channel can produce.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned HTTP {0}")]
    Status(u16),

    #[error("{failed} of {total} webhook posts failed")]
    Partial { failed: usize, total: usize },

    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Invalid email message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// One delivery backend.
///
/// `deliver` attempts the entire batch as one operation and reports a single
/// success or failure; the dispatcher treats a partially delivered batch as
/// a channel failure.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, events: &[AlertEvent]) -> Result<(), ChannelError>;
}

/// Result of one channel's delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// Whole batch delivered; carries the number of events.
    Delivered(usize),
    /// Delivery failed; terminal for this call, no automatic retry.
    Failed(String),
}

/// Per-channel outcome of a dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub channel: &'static str,
    pub result: DeliveryResult,
}

impl DeliveryOutcome {
    pub fn delivered_count(&self) -> usize {
        match self.result {
            DeliveryResult::Delivered(n) => n,
            DeliveryResult::Failed(_) => 0,
        }
    }
}

/// Format an epoch-millis timestamp for human-facing output.
pub(crate) fn format_timestamp(ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(ms as i64)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delivered_count() {
        let ok = DeliveryOutcome {
            channel: "console",
            result: DeliveryResult::Delivered(3),
        };
        let failed = DeliveryOutcome {
            channel: "webhook",
            result: DeliveryResult::Failed("HTTP 500".to_string()),
        };
        assert_eq!(ok.delivered_count(), 3);
        assert_eq!(failed.delivered_count(), 0);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
    }
}
