//! Configuration for tasks and the registry.
//!
//! Two levels of configuration:
//! 1. **Per task**: [`TaskSettings`] — identity, command-queue capacity, dwell
//!    bounds. Passed to [`TaskRegistry::add`](crate::tasks::TaskRegistry::add).
//! 2. **Registry-wide**: [`RegistryConfig`] — shutdown grace, event-bus
//!    capacity, and the device serial used to derive result topics.

use std::fmt;
use std::time::Duration;

use crate::control::dwell::DwellBounds;

/// Stable task identifier, unique across a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u16);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-task configuration.
///
/// The command queue is a control-plane channel: capacities stay small (the
/// original controllers use 2–5 slots). A full queue is reported to the
/// caller, never buffered past capacity.
#[derive(Debug, Clone, Copy)]
pub struct TaskSettings {
    /// Registry-unique identifier.
    pub id: TaskId,

    /// Bounded capacity of the task's command queue.
    pub queue_capacity: usize,

    /// Bounds and default for the periodic dwell interval.
    pub dwell: DwellBounds,
}

impl TaskSettings {
    /// Creates settings with the default queue capacity and dwell bounds.
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            queue_capacity: 5,
            dwell: DwellBounds::default(),
        }
    }

    /// Sets the command-queue capacity (clamped to a minimum of 1).
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Sets the dwell bounds.
    pub fn with_dwell(mut self, dwell: DwellBounds) -> Self {
        self.dwell = dwell;
        self
    }
}

/// Registry-wide configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum time to wait for bodies to unwind during coordinated shutdown.
    ///
    /// When exceeded, [`shutdown`](crate::tasks::TaskRegistry::shutdown)
    /// returns [`RuntimeError::GraceExceeded`](crate::RuntimeError) naming the
    /// tasks still running.
    pub grace: Duration,

    /// Capacity of the event-bus broadcast ring buffer (minimum 1).
    pub bus_capacity: usize,

    /// Device serial number, used as the prefix of every results topic
    /// (`"<serial>/<TaskName>"`).
    pub serial: String,
}

impl Default for RegistryConfig {
    /// Defaults:
    /// - `grace = 30s`
    /// - `bus_capacity = 256`
    /// - `serial = "0000000000"` (placeholder until the device serial is read)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 256,
            serial: "0000000000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_clamp_queue_capacity() {
        let s = TaskSettings::new(TaskId(3)).with_queue_capacity(0);
        assert_eq!(s.queue_capacity, 1);
    }

    #[test]
    fn default_dwell_bounds_follow_controller_limits() {
        let s = TaskSettings::new(TaskId(1));
        assert_eq!(s.dwell.min, Duration::from_secs(5));
        assert_eq!(s.dwell.max, Duration::from_secs(60));
        assert_eq!(s.dwell.default, Duration::from_secs(30));
    }
}
