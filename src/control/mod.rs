//! Control-plane primitives shared by every task.
//!
//! - [`guard`]: at-most-one-execution lock per task;
//! - [`dwell`]: cancellable sleep used by periodic loops;
//! - [`queue`]: bounded, non-blocking per-task command channel;
//! - [`status`]: process-wide single-slot activity register;
//! - [`progress`]: last-progress timestamps for stall detection.

pub mod dwell;
pub mod guard;
pub mod progress;
pub mod queue;
pub mod status;

pub use dwell::{DwellBounds, DwellOutcome, DwellTime, dwell};
pub use guard::{ExecutionGuard, RunPermit};
pub use progress::ProgressTracker;
pub use queue::{CommandQueue, CommandSender};
pub use status::{AppStatus, StatusRegister};
