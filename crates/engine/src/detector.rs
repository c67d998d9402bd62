//! Threshold crossing detector.
//!
//! Compares each poll cycle's snapshots against the immediately preceding
//! cycle and emits alert events for metric changes beyond the configured
//! thresholds.

use compact_str::CompactString;
use defiwatch_core::fmt::format_usd;
use defiwatch_core::{now_ms, AlertEvent, Direction, MetricKind, Severity, Snapshot};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Configuration for the threshold detector.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Master switch; when false, `check` is a no-op.
    pub enabled: bool,
    /// Price change threshold in percent.
    pub price_threshold_pct: f64,
    /// TVL change threshold in percent.
    pub tvl_threshold_pct: f64,
    /// APY change threshold in absolute percentage points.
    pub apy_threshold_pts: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            price_threshold_pct: 5.0,
            tvl_threshold_pct: 10.0,
            apy_threshold_pts: 1.0,
        }
    }
}

/// Stateful detector holding the last-seen snapshot per protocol.
///
/// The baseline map starts empty, so the first observation of any protocol
/// never alerts. Baselines live only for the process lifetime and are owned
/// exclusively by this instance; callers in a concurrent setting must
/// confine it to a single task or guard it themselves.
#[derive(Debug)]
pub struct ThresholdDetector {
    config: DetectorConfig,
    baselines: HashMap<CompactString, Snapshot>,
}

impl ThresholdDetector {
    /// Create a new detector with the given configuration and no baselines.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            baselines: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Number of protocols with an established baseline.
    pub fn baseline_count(&self) -> usize {
        self.baselines.len()
    }

    /// Compare a batch of current snapshots against the stored baselines
    /// and return the alerts that fired.
    ///
    /// Every well-formed entry in the batch replaces its baseline whether or
    /// not it alerted, so each pass compares only against the immediately
    /// preceding one. Entries without a protocol id are skipped and do not
    /// touch the baseline. Order is stable per protocol: price, tvl, apy.
    pub fn check(&mut self, current: &[Snapshot]) -> Vec<AlertEvent> {
        if !self.config.enabled {
            return Vec::new();
        }

        let mut alerts = Vec::new();

        for snap in current {
            if snap.protocol_id.is_empty() {
                warn!(name = %snap.name, "skipping snapshot without protocol id");
                continue;
            }

            match self.baselines.get(&snap.protocol_id) {
                Some(prev) => self.compare(prev, snap, &mut alerts),
                None => {
                    debug!(protocol = %snap.protocol_id, "baseline established");
                }
            }
        }

        for snap in current {
            if !snap.protocol_id.is_empty() {
                self.baselines.insert(snap.protocol_id.clone(), snap.clone());
            }
        }

        alerts
    }

    fn compare(&self, prev: &Snapshot, curr: &Snapshot, alerts: &mut Vec<AlertEvent>) {
        if let Some(delta) = percent_delta(prev.price_usd, curr.price_usd) {
            if delta.abs() >= self.config.price_threshold_pct {
                let direction = Direction::from_delta(delta);
                alerts.push(AlertEvent {
                    metric: MetricKind::Price,
                    protocol_id: curr.protocol_id.clone(),
                    protocol_name: curr.name.clone(),
                    severity: escalate(delta, self.config.price_threshold_pct),
                    direction,
                    message: format!(
                        "{} {} by {:.2}%!\nPrevious: ${:.4}\nCurrent: ${:.4}",
                        direction.arrow(),
                        direction.label(),
                        delta.abs(),
                        prev.price_usd.unwrap_or_default(),
                        curr.price_usd.unwrap_or_default(),
                    ),
                    detected_at_ms: now_ms(),
                });
            }
        }

        if let Some(delta) = percent_delta(prev.tvl_usd, curr.tvl_usd) {
            if delta.abs() >= self.config.tvl_threshold_pct {
                let direction = Direction::from_delta(delta);
                alerts.push(AlertEvent {
                    metric: MetricKind::Tvl,
                    protocol_id: curr.protocol_id.clone(),
                    protocol_name: curr.name.clone(),
                    severity: escalate(delta, self.config.tvl_threshold_pct),
                    direction,
                    message: format!(
                        "{} {} by {:.2}%!\nPrevious: ${}\nCurrent: ${}",
                        direction.arrow(),
                        direction.label(),
                        delta.abs(),
                        format_usd(prev.tvl_usd.unwrap_or_default()),
                        format_usd(curr.tvl_usd.unwrap_or_default()),
                    ),
                    detected_at_ms: now_ms(),
                });
            }
        }

        if let (Some(prev_apy), Some(curr_apy)) = (prev.apy_pct, curr.apy_pct) {
            let delta = curr_apy - prev_apy;
            if delta.abs() >= self.config.apy_threshold_pts {
                let direction = Direction::from_delta(delta);
                alerts.push(AlertEvent {
                    metric: MetricKind::Apy,
                    protocol_id: curr.protocol_id.clone(),
                    protocol_name: curr.name.clone(),
                    // APY swings are routine; never escalate past MEDIUM
                    severity: Severity::Medium,
                    direction,
                    message: format!(
                        "{} {} by {:.2}%!\nPrevious: {:.2}%\nCurrent: {:.2}%",
                        direction.arrow(),
                        direction.label(),
                        delta.abs(),
                        prev_apy,
                        curr_apy,
                    ),
                    detected_at_ms: now_ms(),
                });
            }
        }
    }
}

/// Percent delta between previous and current values.
///
/// Returns None if either value is absent or the previous value is zero,
/// which suppresses the check entirely (no division, no alert).
fn percent_delta(prev: Option<f64>, curr: Option<f64>) -> Option<f64> {
    let prev = prev?;
    let curr = curr?;
    if prev == 0.0 {
        return None;
    }
    Some((curr - prev) / prev * 100.0)
}

/// HIGH at twice the base threshold, MEDIUM below; inclusive boundary.
fn escalate(delta: f64, threshold: f64) -> Severity {
    if delta.abs() >= threshold * 2.0 {
        Severity::High
    } else {
        Severity::Medium
    }
}
