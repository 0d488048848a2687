//! # Command messages and the name→variant binding table.
//!
//! Control requests travel as the tagged [`Command`] enum: the three
//! universal operations plus a task-specific `Custom` payload. Inbound text
//! commands are mapped to variants through a static table of
//! [`CommandBinding`]s declared by each task at registration time, so
//! dispatch matches on an enum instead of strings while the external text
//! interface stays intact.

use std::time::Duration;

/// Control message consumed by a task's dispatch context.
#[derive(Debug, Clone)]
pub enum Command<C> {
    /// Spawn the task body (periodic loop or one-shot unit).
    Start(StartParams),
    /// Cooperatively stop the running body.
    Stop,
    /// Stop the body and tear down the dispatch context.
    Shutdown,
    /// Task-specific operation.
    Custom(C),
}

/// Parameters carried by a start request.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartParams {
    /// Dwell override; clamped to the task's bounds when applied.
    pub dwell: Option<Duration>,
}

impl StartParams {
    /// Start with a dwell override.
    pub fn with_dwell(dwell: Duration) -> Self {
        Self { dwell: Some(dwell) }
    }
}

/// Positional text parameters of an inbound command.
#[derive(Debug, Clone, Default)]
pub struct CommandParams(Vec<String>);

impl CommandParams {
    /// Wraps tokenized parameters.
    pub fn new(params: Vec<String>) -> Self {
        Self(params)
    }

    /// Raw parameter at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no parameters were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the parameter at `index` as whole seconds.
    ///
    /// Returns `None` when the parameter is absent or not a number; range
    /// clamping happens where the value is applied.
    pub fn duration_secs_at(&self, index: usize) -> Option<Duration> {
        self.0
            .get(index)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

/// How one inbound command name maps onto a [`Command`] variant.
pub enum BindingKind<C> {
    /// Maps to [`Command::Start`]; parameter 0, when present, overrides the
    /// dwell interval in seconds.
    Start,
    /// Maps to a stop request.
    Stop,
    /// Builds a task-specific command from the parameters; `None` rejects
    /// the command as invalid.
    Custom(fn(&CommandParams) -> Option<C>),
}

/// One entry of a task's command table.
pub struct CommandBinding<C> {
    /// External command name, e.g. `MEASURE_NOW`.
    pub name: &'static str,
    /// Variant this name maps to.
    pub kind: BindingKind<C>,
}

impl<C> CommandBinding<C> {
    /// Binds `name` to a start request.
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            kind: BindingKind::Start,
        }
    }

    /// Binds `name` to a stop request.
    pub fn stop(name: &'static str) -> Self {
        Self {
            name,
            kind: BindingKind::Stop,
        }
    }

    /// Binds `name` to a task-specific command built from the parameters.
    pub fn custom(name: &'static str, build: fn(&CommandParams) -> Option<C>) -> Self {
        Self {
            name,
            kind: BindingKind::Custom(build),
        }
    }
}

/// Command type for tasks with no task-specific operations.
#[derive(Debug, Clone, Copy)]
pub enum NoCommand {}
