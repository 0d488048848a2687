//! # Events emitted by the task control layer.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata.
//! Every event gets a globally monotonic sequence number, so subscribers can
//! restore order even when delivery interleaves across tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of control-layer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task lifecycle ===
    /// One-time setup (guard, queue, control subscription) succeeded.
    TaskInitialized,

    /// A body (periodic loop or one-shot unit) was spawned.
    TaskStarting,

    /// A body exited; the task is back in its initialised, restartable state.
    TaskStopped,

    /// A start was requested while the body was already running.
    ///
    /// This is the success-with-warning path: no second body is spawned.
    StartIgnored,

    /// A cooperative stop was requested. Termination follows asynchronously.
    StopRequested,

    // === Body and dispatch failures ===
    /// One unit of work failed; a periodic loop continues with its next cycle.
    CycleFailed,

    /// A task-specific command handler returned an error.
    CommandFailed,

    /// A command could not be enqueued or carried unusable parameters.
    CommandRejected,

    /// An inbound command name matched no binding; dropped.
    CommandUnknown,

    /// Publishing a result payload failed; not retried.
    PublishFailed,

    // === Shutdown sequence ===
    /// Coordinated shutdown has begun.
    ShutdownRequested,

    /// Every body unwound within the grace period.
    AllStoppedWithin,

    /// The grace period elapsed with bodies still running.
    GraceExceeded,
}

/// A control-layer event with optional metadata.
///
/// `seq` is globally monotonic; `at` is wall-clock for logs. `task` and
/// `reason` are set depending on the kind.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task involved, if any.
    pub task: Option<Arc<str>>,
    /// Human-readable detail (error text, rejected command name, ...).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind, stamped with the current time and
    /// the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, Ordering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
        }
    }

    /// Attaches the task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable detail.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
