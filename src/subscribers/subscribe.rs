//! # The subscriber contract.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// `on_event` runs on the subscriber's dedicated worker. Implementations may
/// be slow (I/O, batching) without affecting publishers or other subscribers;
/// they should still prefer async I/O over blocking the runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name for diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue; events are dropped for this
    /// subscriber when it overflows.
    fn queue_capacity(&self) -> usize {
        256
    }
}
