//! # Non-blocking fan-out over multiple subscribers.
//!
//! [`SubscriberSet`] hands each event to every subscriber through a bounded
//! per-subscriber queue drained by a dedicated worker.
//!
//! Guarantees: `emit` returns immediately; per-subscriber FIFO; a panicking
//! subscriber is isolated (caught and reported, worker keeps running).
//! Not guaranteed: cross-subscriber ordering; delivery on overflow (events
//! are dropped for the lagging subscriber only).

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;

use super::Subscribe;

struct Channel {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Fan-out set with one bounded queue and worker per subscriber.
pub struct SubscriberSet {
    channels: Vec<Channel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subscribers.len());
        let mut workers = Vec::with_capacity(subscribers.len());

        for subscriber in subscribers {
            let name = subscriber.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(subscriber.queue_capacity().max(1));

            let worker = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    let handled = subscriber.on_event(event.as_ref());
                    if let Err(panic_info) =
                        std::panic::AssertUnwindSafe(handled).catch_unwind().await
                    {
                        eprintln!(
                            "[taskwarden] subscriber '{}' panicked: {panic_info:?}",
                            subscriber.name()
                        );
                    }
                }
            });

            channels.push(Channel { name, tx });
            workers.push(worker);
        }

        Self { channels, workers }
    }

    /// Hands one event to every subscriber without awaiting any of them.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.tx.try_send(Arc::clone(&shared)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    eprintln!(
                        "[taskwarden] subscriber '{}' dropped event: queue full",
                        channel.name
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    eprintln!(
                        "[taskwarden] subscriber '{}' dropped event: worker gone",
                        channel.name
                    );
                }
            }
        }
    }

    /// Closes all queues and waits for the workers to drain.
    pub async fn shutdown(self) {
        drop(self.channels);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True if the set has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
