//! In-memory monitor state shared between the poll loop and report output.

use std::sync::atomic::{AtomicU64, Ordering};

use compact_str::CompactString;
use dashmap::DashMap;
use defiwatch_core::{now_ms, ProtocolSpec, Snapshot};

/// Latest snapshot per protocol, keyed by protocol id.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: DashMap<CompactString, Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored snapshot for every protocol in the batch.
    /// Entries without a protocol id are ignored.
    pub fn update(&self, batch: &[Snapshot]) {
        for snapshot in batch {
            if snapshot.protocol_id.is_empty() {
                continue;
            }
            self.snapshots
                .insert(snapshot.protocol_id.clone(), snapshot.clone());
        }
    }

    pub fn get(&self, protocol_id: &str) -> Option<Snapshot> {
        self.snapshots.get(protocol_id).map(|s| s.clone())
    }

    /// Latest snapshots in registry order, skipping protocols that have not
    /// been observed yet.
    pub fn latest(&self, registry: &[ProtocolSpec]) -> Vec<Snapshot> {
        registry
            .iter()
            .filter_map(|spec| self.get(&spec.id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Counters for the monitor run.
#[derive(Debug, Default)]
pub struct MonitorStats {
    /// Number of completed poll cycles.
    pub cycles: AtomicU64,
    /// Number of snapshots fetched across all cycles.
    pub snapshots_fetched: AtomicU64,
    /// Number of alert events raised by the detector.
    pub alerts_raised: AtomicU64,
    /// Sum of delivered counts across dispatches.
    pub alerts_delivered: AtomicU64,
    /// Start time in milliseconds.
    pub started_at_ms: AtomicU64,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self {
            started_at_ms: AtomicU64::new(now_ms()),
            ..Default::default()
        }
    }

    /// Record a finished poll cycle and return the new cycle count.
    pub fn record_cycle(&self, snapshots: usize) -> u64 {
        self.snapshots_fetched
            .fetch_add(snapshots as u64, Ordering::Relaxed);
        self.cycles.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_alerts(&self, raised: usize, delivered: usize) {
        self.alerts_raised.fetch_add(raised as u64, Ordering::Relaxed);
        self.alerts_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        now_ms().saturating_sub(self.started_at_ms.load(Ordering::Relaxed)) / 1000
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            cycles: self.cycles.load(Ordering::Relaxed),
            snapshots_fetched: self.snapshots_fetched.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            alerts_delivered: self.alerts_delivered.load(Ordering::Relaxed),
            uptime_secs: self.uptime_secs(),
        }
    }
}

/// Summary of monitor counters.
#[derive(Debug, Clone)]
pub struct StatsSummary {
    pub cycles: u64,
    pub snapshots_fetched: u64,
    pub alerts_raised: u64,
    pub alerts_delivered: u64,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(id: &str, price: f64) -> Snapshot {
        Snapshot {
            protocol_id: id.into(),
            name: id.to_uppercase(),
            price_usd: Some(price),
            tvl_usd: None,
            apy_pct: None,
            market_cap_usd: None,
            price_change_24h_pct: None,
            tvl_change_24h_pct: None,
            observed_at_ms: now_ms(),
            error: None,
        }
    }

    #[test]
    fn test_store_overwrites_latest() {
        let store = SnapshotStore::new();
        store.update(&[snapshot("aave", 180.0)]);
        store.update(&[snapshot("aave", 195.0)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("aave").unwrap().price_usd, Some(195.0));
    }

    #[test]
    fn test_store_skips_missing_ids() {
        let store = SnapshotStore::new();
        store.update(&[snapshot("", 1.0), snapshot("lido", 2.0)]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_latest_follows_registry_order() {
        let store = SnapshotStore::new();
        store.update(&[snapshot("eigenlayer", 3.0), snapshot("aave", 180.0)]);
        let registry = ProtocolSpec::default_registry();
        let latest = store.latest(&registry);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].protocol_id, "aave");
        assert_eq!(latest[1].protocol_id, "eigenlayer");
    }

    #[test]
    fn test_stats_counters() {
        let stats = MonitorStats::new();
        assert_eq!(stats.record_cycle(3), 1);
        assert_eq!(stats.record_cycle(3), 2);
        stats.record_alerts(2, 4);
        let summary = stats.summary();
        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.snapshots_fetched, 6);
        assert_eq!(summary.alerts_raised, 2);
        assert_eq!(summary.alerts_delivered, 4);
    }
}
