//! # Event bus for pipeline events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] carrying
//! [`TaskEvent`]s from every tracked task to pipeline subscribers.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active subscribers at send time.

use tokio::sync::broadcast;

use super::event::TaskEvent;

/// Broadcast channel for pipeline events.
#[derive(Clone, Debug)]
pub(crate) struct Bus {
    tx: broadcast::Sender<TaskEvent>,
}

impl Bus {
    /// Creates a new bus; the minimum capacity is 1 (clamped).
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<TaskEvent>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    pub(crate) fn publish(&self, ev: TaskEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }
}
