//! # Per-task command queue.
//!
//! A bounded many-producers / single-consumer channel that marshals control
//! requests from arbitrary calling contexts into the task's own dispatch
//! context.
//!
//! ## Rules
//! - [`CommandSender::send`] never blocks: a full queue is reported as
//!   [`ControlError::QueueFull`], a torn-down consumer as
//!   [`ControlError::QueueClosed`]. Both are non-fatal; retrying is the
//!   caller's decision.
//! - Messages for one task are consumed in FIFO order. Nothing is guaranteed
//!   across different tasks' queues.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::ControlError;

/// Creates a bounded command channel for the named task.
///
/// Capacity is clamped to a minimum of 1. Control queues are small by design
/// (the original controllers use 2–5 slots).
pub fn channel<M>(task: &str, capacity: usize) -> (CommandSender<M>, CommandQueue<M>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task: Arc<str> = Arc::from(task);
    (CommandSender { tx, task }, CommandQueue { rx })
}

/// Producer half: shared by every context that may control the task.
pub struct CommandSender<M> {
    tx: mpsc::Sender<M>,
    task: Arc<str>,
}

impl<M> Clone for CommandSender<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            task: Arc::clone(&self.task),
        }
    }
}

impl<M> CommandSender<M> {
    /// Enqueues a command without blocking.
    pub fn send(&self, message: M) -> Result<(), ControlError> {
        self.tx.try_send(message).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => ControlError::QueueFull {
                task: self.task.to_string(),
            },
            mpsc::error::TrySendError::Closed(_) => ControlError::QueueClosed {
                task: self.task.to_string(),
            },
        })
    }

    /// Name of the task this sender controls.
    pub fn task(&self) -> &str {
        &self.task
    }
}

/// Consumer half: owned by the task's dispatch context.
pub struct CommandQueue<M> {
    rx: mpsc::Receiver<M>,
}

impl<M> CommandQueue<M> {
    /// Waits for the next command; `None` once all senders are gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commands_arrive_in_fifo_order() {
        let (tx, mut rx) = channel::<u32>("probe", 5);
        tx.send(1).expect("enqueue 1");
        tx.send(2).expect("enqueue 2");
        tx.send(3).expect("enqueue 3");

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
    }

    #[tokio::test]
    async fn full_queue_is_reported_not_awaited() {
        let (tx, _rx) = channel::<u32>("probe", 2);
        tx.send(1).expect("enqueue 1");
        tx.send(2).expect("enqueue 2");

        let err = tx.send(3).expect_err("third enqueue must overflow");
        assert_eq!(
            err,
            ControlError::QueueFull {
                task: "probe".into()
            }
        );
    }

    #[tokio::test]
    async fn closed_queue_is_reported() {
        let (tx, rx) = channel::<u32>("probe", 2);
        drop(rx);

        let err = tx.send(1).expect_err("send to closed queue must fail");
        assert_eq!(
            err,
            ControlError::QueueClosed {
                task: "probe".into()
            }
        );
    }
}
