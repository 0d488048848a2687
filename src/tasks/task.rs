//! # Task abstraction and execution context.
//!
//! A [`Task`] supplies the identity, run mode, command table, and the actual
//! work; the lifecycle layer supplies everything else (queue, guard, dwell,
//! event publishing). One `Task` value is instantiated per
//! [`TaskLifecycle`](crate::tasks::TaskLifecycle) and shared by its contexts.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::TaskSettings;
use crate::control::dwell::DwellTime;
use crate::control::guard::{ExecutionGuard, RunPermit};
use crate::control::progress::ProgressTracker;
use crate::error::{ControlError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::link::{MessageLink, Qos, results_topic};

use super::command::CommandBinding;
use super::lifecycle::TaskDeps;

/// How a task's body executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// The body loops: one unit of work, then a cancellable dwell, repeat.
    Periodic,
    /// The body is a single unit of work per start request. A start issued
    /// while the unit is executing cancels it instead (cancel-on-resubmit).
    OneShot,
}

/// A unit of periodic or on-demand work under lifecycle supervision.
///
/// Implementations hold their collaborators (a radio handle, a sensor
/// driver) and stay free of control-flow concerns: starting, stopping,
/// queueing, and mutual exclusion belong to the lifecycle.
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Task-specific command payload; use
    /// [`NoCommand`](crate::tasks::NoCommand) when there is none.
    type Command: Send + 'static;

    /// Stable, human-readable name; also derives the task's topic names.
    fn name(&self) -> &str;

    /// How the body executes.
    fn mode(&self) -> RunMode;

    /// The task's command table, registered on its control topic at init.
    fn bindings(&self) -> Vec<CommandBinding<Self::Command>> {
        Vec::new()
    }

    /// Executes one unit of work (one periodic cycle, or the whole one-shot
    /// body). The guard is held by the caller for the duration of the call.
    ///
    /// Long-running units must check `stop` between steps and return
    /// [`TaskError::Canceled`] promptly when it fires.
    async fn run_unit(&self, ctx: &TaskContext, stop: &CancellationToken)
    -> Result<(), TaskError>;

    /// Handles a task-specific command on the dispatch context.
    ///
    /// Handlers that execute work must take the guard themselves via
    /// [`TaskContext::hold_guard`].
    async fn on_command(&self, command: Self::Command, ctx: &TaskContext) -> Result<(), TaskError>;

    /// Invoked exactly once when a body exits, before the stop is observable
    /// through the lifecycle.
    fn on_stopped(&self) {}
}

/// Runtime facilities handed to a task's body and command handlers.
pub struct TaskContext {
    name: Arc<str>,
    results_topic: String,
    link: Arc<dyn MessageLink>,
    bus: Bus,
    dwell: DwellTime,
    guard: ExecutionGuard,
    progress: Arc<ProgressTracker>,
}

impl TaskContext {
    pub(crate) fn new(
        name: &str,
        settings: &TaskSettings,
        deps: &TaskDeps,
        guard: ExecutionGuard,
    ) -> Self {
        Self {
            name: Arc::from(name),
            results_topic: results_topic(&deps.serial, name),
            link: Arc::clone(&deps.link),
            bus: deps.bus.clone(),
            dwell: DwellTime::new(settings.dwell),
            guard,
            progress: Arc::clone(&deps.progress),
        }
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The task's results topic.
    pub fn results_topic(&self) -> &str {
        &self.results_topic
    }

    /// Shared dwell interval (readable everywhere, writable by dispatch).
    pub fn dwell(&self) -> &DwellTime {
        &self.dwell
    }

    /// The task's execution guard.
    pub fn guard(&self) -> &ExecutionGuard {
        &self.guard
    }

    /// Event bus for custom observability from task code.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Takes the execution guard; for command handlers that run work outside
    /// the supervised body.
    pub async fn hold_guard(&self) -> Result<RunPermit, ControlError> {
        self.guard.hold().await
    }

    /// Records that this task made progress (stall health signal).
    pub async fn mark_progress(&self) {
        self.progress.mark(&self.name).await;
    }

    /// Publishes a result payload at-most-once.
    ///
    /// A publish failure is reported on the event bus and not retried.
    pub async fn publish(&self, payload: &str) {
        if let Err(err) = self
            .link
            .publish(&self.results_topic, payload, Qos::AtMostOnce)
            .await
        {
            self.bus.publish(
                Event::new(EventKind::PublishFailed)
                    .with_task(Arc::clone(&self.name))
                    .with_reason(err.to_string()),
            );
        }
    }
}
