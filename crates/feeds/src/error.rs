//! Error types for feed operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching upstream data.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Expected data missing from response: {0}")]
    MissingData(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl FeedError {
    /// Returns true if this error is transient and likely to succeed on a
    /// later poll cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Http(_) | FeedError::RateLimitExceeded => true,
            FeedError::Status { status, .. } => *status == 429 || *status >= 500,
            FeedError::ParseError(_) | FeedError::MissingData(_) => false,
        }
    }

    /// Suggested delay before the metric is worth re-requesting, if any.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            FeedError::RateLimitExceeded => Some(Duration::from_secs(60)),
            FeedError::Http(_) => Some(Duration::from_secs(5)),
            FeedError::Status { status, .. } if *status >= 500 => Some(Duration::from_secs(5)),
            _ => None,
        }
    }
}
