//! # Cancellable dwell between periodic executions.
//!
//! [`dwell`] sleeps for the task's dwell interval but wakes immediately when
//! a stop is requested, so a stop issued mid-interval is honored within the
//! runtime's wakeup latency rather than at the next interval boundary. This
//! is the **only** mechanism by which a stop request converts into loop
//! termination; loop bodies never poll their command queue.
//!
//! [`DwellTime`] is the shared, runtime-mutable interval: a start command may
//! carry a new value, which is clamped to the task's [`DwellBounds`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

/// How a dwell ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellOutcome {
    /// The full interval elapsed; the loop runs another cycle.
    Elapsed,
    /// A stop request cut the dwell short; the loop must exit.
    Interrupted,
}

/// Sleeps up to `interval`, waking early if `stop` is cancelled.
///
/// Returns [`DwellOutcome::Interrupted`] immediately when `stop` is already
/// cancelled on entry.
pub async fn dwell(interval: Duration, stop: &CancellationToken) -> DwellOutcome {
    if stop.is_cancelled() {
        return DwellOutcome::Interrupted;
    }

    let sleep = time::sleep(interval);
    tokio::pin!(sleep);

    tokio::select! {
        () = &mut sleep => DwellOutcome::Elapsed,
        () = stop.cancelled() => DwellOutcome::Interrupted,
    }
}

/// Inclusive bounds and default for a task's dwell interval.
#[derive(Debug, Clone, Copy)]
pub struct DwellBounds {
    /// Smallest accepted interval.
    pub min: Duration,
    /// Largest accepted interval.
    pub max: Duration,
    /// Interval used until a command overrides it.
    pub default: Duration,
}

impl DwellBounds {
    /// Clamps `interval` into `[min, max]`.
    pub fn clamp(&self, interval: Duration) -> Duration {
        interval.clamp(self.min, self.max)
    }
}

impl Default for DwellBounds {
    /// The original controller's limits: 5s–60s, default 30s.
    fn default() -> Self {
        Self {
            min: Duration::from_secs(5),
            max: Duration::from_secs(60),
            default: Duration::from_secs(30),
        }
    }
}

/// Shared handle to a task's current dwell interval.
///
/// Readable from the loop, writable from command dispatch; writes are clamped
/// to the bounds fixed at construction.
#[derive(Clone)]
pub struct DwellTime {
    millis: Arc<AtomicU64>,
    bounds: DwellBounds,
}

impl DwellTime {
    /// Creates a handle starting at the bounds' default interval.
    pub fn new(bounds: DwellBounds) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(as_millis_u64(bounds.default))),
            bounds,
        }
    }

    /// Current interval.
    pub fn get(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::Relaxed))
    }

    /// Replaces the interval, clamped to the bounds.
    pub fn set(&self, interval: Duration) {
        let clamped = self.bounds.clamp(interval);
        self.millis.store(as_millis_u64(clamped), Ordering::Relaxed);
    }

    /// The bounds fixed at construction.
    pub fn bounds(&self) -> DwellBounds {
        self.bounds
    }
}

fn as_millis_u64(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
