//! # Broadcast bus for control-layer events.
//!
//! Thin wrapper around [`tokio::sync::broadcast`]. Many publishers (task
//! bodies, dispatch contexts, the registry), independent receivers.
//!
//! ## Rules
//! - `publish()` never blocks and never fails: with no receivers the event is
//!   simply dropped.
//! - Capacity is a ring buffer; a lagging receiver observes
//!   `RecvError::Lagged(n)` and skips the `n` oldest events.
//! - No persistence or delivery guarantee — the bus is observability, not a
//!   control path.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for [`Event`]s. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given ring-buffer capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Creates a receiver observing events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
