//! Per-action tracing spans

use std::time::Instant;

use tracing::{info_span, Span};

use crate::core_store::ActionError;
use crate::metrics;

/// Span and timer for one dispatched action instance
pub struct ActionTrace {
    span: Span,
    path: String,
    start: Instant,
}

impl ActionTrace {
    /// Open the span for action `path` with instance id `id`
    pub fn start(path: &str, id: u64) -> Self {
        let span = info_span!("action", name = path, id);
        tracing::debug!(parent: &span, "action pending");

        Self {
            span,
            path: path.to_string(),
            start: Instant::now(),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Record a successful settle and its duration
    pub fn succeeded(self, commits: u32) {
        let duration = self.start.elapsed();
        metrics::record_action(&self.path, duration, true);
        tracing::info!(
            parent: &self.span,
            commits,
            duration_ms = duration.as_millis() as u64,
            "action succeeded"
        );
    }

    /// Record a failed settle
    pub fn failed(self, error: &ActionError, commits: u32) {
        let duration = self.start.elapsed();
        metrics::record_action(&self.path, duration, false);
        tracing::warn!(
            parent: &self.span,
            commits,
            duration_ms = duration.as_millis() as u64,
            %error,
            "action failed"
        );
    }
}
