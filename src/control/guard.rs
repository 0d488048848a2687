//! # ExecutionGuard: at most one execution unit per task.
//!
//! A binary lock bound 1:1 to a task. The task's own execution contexts hold
//! it for the duration of each unit of work; everything else only asks
//! whether it is held.
//!
//! ## Rules
//! - A body (periodic cycle or one-shot run) holds the guard from the start
//!   of the unit to its end.
//! - `start` paths never await the guard: they call [`ExecutionGuard::is_held`]
//!   or [`ExecutionGuard::try_hold`] and either refuse (periodic) or convert
//!   the request into a cancel (one-shot). Command dispatch stays responsive.
//! - [`ExecutionGuard::hold`] is reserved for the task's own contexts, where
//!   contention is short by design (a cycle, not a lifetime).

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::ControlError;

/// Mutual-exclusion lock for one task's execution units.
///
/// Cheap to clone; all clones share the same underlying permit.
#[derive(Clone)]
pub struct ExecutionGuard {
    sem: Arc<Semaphore>,
}

/// Proof of holding an [`ExecutionGuard`]; releases on drop.
pub struct RunPermit {
    _permit: OwnedSemaphorePermit,
}

impl ExecutionGuard {
    /// Creates a released guard.
    pub fn new() -> Self {
        Self {
            sem: Arc::new(Semaphore::new(1)),
        }
    }

    /// Non-blocking query: is a unit of work executing right now?
    pub fn is_held(&self) -> bool {
        self.sem.available_permits() == 0
    }

    /// Attempts to take the guard without waiting.
    pub fn try_hold(&self) -> Option<RunPermit> {
        self.sem
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| RunPermit { _permit: permit })
    }

    /// Takes the guard, waiting for the current holder if necessary.
    ///
    /// Only task-owned contexts call this; waits are bounded by one unit of
    /// work because the guard is released between periodic cycles.
    pub async fn hold(&self) -> Result<RunPermit, ControlError> {
        self.sem
            .clone()
            .acquire_owned()
            .await
            .map(|permit| RunPermit { _permit: permit })
            .map_err(|_| ControlError::Unknown {
                reason: "execution guard closed".to_string(),
            })
    }

    /// Completes once the guard is released (immediately if it already is).
    ///
    /// Used by the shutdown path to observe that in-flight work has drained.
    pub async fn wait_released(&self) {
        if let Ok(permit) = self.sem.acquire().await {
            drop(permit);
        }
    }
}

impl Default for ExecutionGuard {
    fn default() -> Self {
        Self::new()
    }
}
