//! Store metrics
//!
//! Counters go through the `metrics` facade, so any installed recorder picks
//! them up. Each store also keeps its own atomic tallies, readable through
//! `RootStore::stats`.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

mod collector;

pub use collector::{MetricsCollector, StoreStats};

pub const MUTATIONS_COMMITTED: &str = "store.mutations.committed";
pub const MUTATIONS_REJECTED: &str = "store.mutations.rejected";
pub const ACTIONS_DISPATCHED: &str = "store.actions.dispatched";
pub const ACTIONS_FAILED: &str = "store.actions.failed";
pub const ACTION_DURATION: &str = "store.action.duration_ms";
pub const GETTER_CACHE_HITS: &str = "store.getters.cache_hits";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(MUTATIONS_COMMITTED, "Mutations applied to module state");
    describe_counter!(MUTATIONS_REJECTED, "Mutations rejected by payload validation");
    describe_counter!(ACTIONS_DISPATCHED, "Actions dispatched");
    describe_counter!(ACTIONS_FAILED, "Actions that settled with an error");
    describe_histogram!(ACTION_DURATION, "Action duration from dispatch to settle in milliseconds");
    describe_counter!(GETTER_CACHE_HITS, "Getter evaluations served from the memo cache");
}

pub fn record_commit(path: &str) {
    counter!(MUTATIONS_COMMITTED, "mutation" => path.to_string()).increment(1);
}

pub fn record_rejected(path: &str) {
    counter!(MUTATIONS_REJECTED, "mutation" => path.to_string()).increment(1);
}

pub fn record_cache_hit() {
    counter!(GETTER_CACHE_HITS).increment(1);
}

/// Record one settled action
pub fn record_action(path: &str, duration: Duration, succeeded: bool) {
    counter!(ACTIONS_DISPATCHED, "action" => path.to_string()).increment(1);
    if !succeeded {
        counter!(ACTIONS_FAILED, "action" => path.to_string()).increment(1);
    }
    histogram!(ACTION_DURATION, "action" => path.to_string())
        .record(duration.as_secs_f64() * 1000.0);
}
