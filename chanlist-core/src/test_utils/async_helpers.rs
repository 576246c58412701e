//! Async test helpers

use tokio::sync::broadcast;

use crate::core_store::StoreEvent;

/// Everything already buffered on `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
