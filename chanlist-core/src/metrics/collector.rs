//! Per-store counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::record_cache_hit;

/// Point-in-time copy of a store's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub mutations_committed: u64,
    pub mutations_rejected: u64,
    pub actions_dispatched: u64,
    pub actions_failed: u64,
    pub getter_cache_hits: u64,
}

/// Atomic counters owned by one store
#[derive(Debug)]
pub struct MetricsCollector {
    commits: AtomicU64,
    rejected: AtomicU64,
    actions_dispatched: AtomicU64,
    actions_failed: AtomicU64,
    cache_hits: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            commits: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            actions_dispatched: AtomicU64::new(0),
            actions_failed: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    pub fn inc_commits(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_actions_dispatched(&self) {
        self.actions_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_actions_failed(&self) {
        self.actions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Also forwarded to the global recorder
    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        record_cache_hit();
    }

    pub fn snapshot(&self) -> StoreStats {
        StoreStats {
            mutations_committed: self.commits.load(Ordering::Relaxed),
            mutations_rejected: self.rejected.load(Ordering::Relaxed),
            actions_dispatched: self.actions_dispatched.load(Ordering::Relaxed),
            actions_failed: self.actions_failed.load(Ordering::Relaxed),
            getter_cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let collector = MetricsCollector::new();
        collector.inc_commits();
        collector.inc_commits();
        collector.inc_rejected();
        collector.inc_actions_dispatched();
        collector.inc_actions_failed();
        collector.inc_cache_hits();

        let stats = collector.snapshot();
        assert_eq!(stats.mutations_committed, 2);
        assert_eq!(stats.mutations_rejected, 1);
        assert_eq!(stats.actions_dispatched, 1);
        assert_eq!(stats.actions_failed, 1);
        assert_eq!(stats.getter_cache_hits, 1);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let json = serde_json::to_value(StoreStats::default()).unwrap();
        assert_eq!(json["mutationsCommitted"], 0);
        assert_eq!(json["getterCacheHits"], 0);
    }
}
