//! Error types used by the taskwarden control layer and by task bodies.
//!
//! Three enums with distinct audiences:
//!
//! - [`ControlError`] — control-plane operations (init/start/stop/enqueue).
//! - [`TaskError`] — failures inside a task's unit of work.
//! - [`RuntimeError`] — coordinated-shutdown failures reported by the registry.
//!
//! All provide `as_label()` returning a short stable snake_case string for
//! logs and metrics.
//!
//! Note that "already running" is deliberately **not** an error: a `start`
//! against a running periodic task succeeds with a warning (see
//! [`StartOutcome`](crate::tasks::StartOutcome)).

use std::time::Duration;
use thiserror::Error;

/// Errors raised by control-plane operations on a task.
///
/// Guard and queue construction are infallible with the primitives this crate
/// uses, so there are no creation-failure kinds; [`ControlError::Unknown`]
/// remains the catch-all for lower collaborators.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The task has not been initialised yet; start/stop refused.
    #[error("task '{task}' is not initialised")]
    NotInitialized {
        /// Name of the task.
        task: String,
    },

    /// `init` was called a second time on the same task.
    #[error("task '{task}' is already initialised")]
    AlreadyInitialized {
        /// Name of the task.
        task: String,
    },

    /// A required parameter was missing or out of range.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// What was wrong with the parameter.
        reason: String,
    },

    /// The task's command queue is at capacity; the command was not enqueued.
    ///
    /// Reported synchronously and non-fatally: the caller decides whether to
    /// retry. The queue is a control-plane channel and never applies
    /// backpressure to the sender.
    #[error("command queue for task '{task}' is full")]
    QueueFull {
        /// Name of the task.
        task: String,
    },

    /// The task's command consumer has shut down.
    #[error("command queue for task '{task}' is closed")]
    QueueClosed {
        /// Name of the task.
        task: String,
    },

    /// No task with the given id exists in the registry.
    #[error("no task registered with id {id}")]
    UnknownTask {
        /// The id that failed to resolve.
        id: u16,
    },

    /// Catch-all for failures surfaced by a lower collaborator.
    #[error("unexpected failure: {reason}")]
    Unknown {
        /// Human-readable description.
        reason: String,
    },
}

impl ControlError {
    /// Short stable label (snake_case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControlError::NotInitialized { .. } => "not_initialized",
            ControlError::AlreadyInitialized { .. } => "already_initialized",
            ControlError::InvalidParameter { .. } => "invalid_parameter",
            ControlError::QueueFull { .. } => "queue_full",
            ControlError::QueueClosed { .. } => "queue_closed",
            ControlError::UnknownTask { .. } => "unknown_task",
            ControlError::Unknown { .. } => "unknown",
        }
    }
}

/// Errors raised inside a task's unit of work.
///
/// These never cross task boundaries: the lifecycle layer catches them,
/// publishes an event, and either continues with the next cycle (`Fail`),
/// ends the body (`Fatal`), or treats the exit as graceful (`Canceled`).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The unit of work failed; the periodic loop proceeds to its next cycle.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable failure; the body terminates.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The unit observed a stop request and exited early.
    #[error("cancelled")]
    Canceled,
}

impl TaskError {
    /// Short stable label (snake_case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Canceled => "task_canceled",
        }
    }
}

/// Errors raised by the registry's coordinated-shutdown path.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The grace period elapsed with task bodies still executing.
    ///
    /// Cancellation is cooperative only: a body that never re-checks its stop
    /// token cannot be terminated from here, so it is reported instead.
    #[error("shutdown grace {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of tasks that were still running when the grace elapsed.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Short stable label (snake_case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "grace_exceeded",
        }
    }
}
