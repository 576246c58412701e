//! Store change notifications
//!
//! Subscribers receive every committed mutation and every action's
//! start/settle transition over a bounded broadcast channel. A slow
//! subscriber lags and loses the oldest events; commits never wait on it.

use serde::Serialize;
use tokio::sync::broadcast;

/// Final state of one dispatched action instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Succeeded,
    Failed,
}

/// Something observable happened in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum StoreEvent {
    /// A mutation was applied; `version` is the store version after it
    Committed { path: String, version: u64 },

    /// An action instance entered `pending`
    ActionStarted { path: String, id: u64 },

    /// An action instance settled after committing `commits` mutations
    ActionSettled {
        path: String,
        id: u64,
        status: ActionStatus,
        commits: u32,
    },
}

/// Fan-out of [`StoreEvent`]s to any number of subscribers
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBroadcaster {
    /// Create a broadcaster buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Emit an event; returns how many subscribers received it
    pub fn emit(&self, event: StoreEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
