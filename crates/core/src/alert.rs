//! Alert event types produced by the threshold detector.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Metric a threshold alert refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Price,
    Tvl,
    Apy,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Price => "price",
            MetricKind::Tvl => "tvl",
            MetricKind::Apy => "apy",
        }
    }
}

/// Direction of a detected change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increased,
    Decreased,
}

impl Direction {
    /// Direction for a signed delta. Zero deltas never cross a positive
    /// threshold, so the detector never asks for one.
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Increased
        } else {
            Direction::Decreased
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Increased => "INCREASED",
            Direction::Decreased => "DECREASED",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Increased => "📈",
            Direction::Decreased => "📉",
        }
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

/// One detected threshold crossing.
///
/// Immutable once created; produced only by the detector, consumed by the
/// dispatcher and report output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub metric: MetricKind,
    pub protocol_id: CompactString,
    pub protocol_name: String,
    pub severity: Severity,
    pub direction: Direction,
    /// Human-readable summary with previous/current values and the delta
    pub message: String,
    /// Detection time, milliseconds since the Unix epoch
    pub detected_at_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_direction_from_delta() {
        assert_eq!(Direction::from_delta(6.0), Direction::Increased);
        assert_eq!(Direction::from_delta(-25.0), Direction::Decreased);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
    }

    #[test]
    fn test_metric_labels() {
        assert_eq!(MetricKind::Price.as_str(), "price");
        assert_eq!(MetricKind::Tvl.as_str(), "tvl");
        assert_eq!(MetricKind::Apy.as_str(), "apy");
    }
}
