//! # TaskRegistry: the ordered set of supervised tasks.
//!
//! Built once at startup; entries are never removed, only (re)initialised
//! and started/stopped. The registry owns the shared collaborators (event
//! bus, subscriber fan-out, progress tracker, shutdown token) and wires them
//! into every lifecycle it creates.
//!
//! ## Shutdown path
//! ```text
//! shutdown():
//!   publish ShutdownRequested
//!   cancel global token ──► every non-explicit-stop body unwinds
//!   within grace:
//!     wait_idle(non-explicit entries)
//!     for each explicit-stop entry, in registration order:
//!       request_stop → wait_idle → teardown
//!   grace exceeded ──► GraceExceeded { stuck } (bodies that never yielded)
//! ```
//!
//! Explicit-stop entries are exempt from the global-token unwind so that a
//! transport-like task can stay up until the tasks publishing through it
//! have drained.

use std::sync::{Arc, Weak};

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::{RegistryConfig, TaskId, TaskSettings};
use crate::control::progress::ProgressTracker;
use crate::error::{ControlError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::link::MessageLink;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::command::StartParams;
use super::lifecycle::{StartOutcome, TaskDeps, TaskHandle, TaskLifecycle};
use super::shutdown::wait_for_shutdown_signal;
use super::task::Task;

struct Entry {
    handle: Arc<dyn TaskHandle>,
    explicit_stop: bool,
}

/// Ordered registry of task lifecycles with bulk startup and coordinated
/// shutdown.
pub struct TaskRegistry {
    cfg: RegistryConfig,
    bus: Bus,
    link: Arc<dyn MessageLink>,
    progress: Arc<ProgressTracker>,
    serial: Arc<str>,
    shutdown: CancellationToken,
    subscribers: Arc<SubscriberSet>,
    entries: Vec<Entry>,
}

impl TaskRegistry {
    /// Creates the registry and spawns the subscriber fan-out listener.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(
        cfg: RegistryConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
        link: Arc<dyn MessageLink>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let subscribers = Arc::new(SubscriberSet::new(subscribers));
        spawn_subscriber_listener(&bus, Arc::downgrade(&subscribers));

        let serial: Arc<str> = Arc::from(cfg.serial.as_str());
        Self {
            cfg,
            bus,
            link,
            progress: Arc::new(ProgressTracker::new()),
            serial,
            shutdown: CancellationToken::new(),
            subscribers,
            entries: Vec::new(),
        }
    }

    /// The registry's event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The shared last-progress tracker.
    pub fn progress(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    /// Registered task names, in registration order.
    pub fn task_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.handle.name().to_string())
            .collect()
    }

    /// Creates and registers a lifecycle for `task`.
    ///
    /// Entries with `explicit_stop` are exempt from the global shutdown
    /// unwind and are stopped individually, in registration order, at the
    /// end of [`shutdown`](TaskRegistry::shutdown).
    ///
    /// Returns the typed lifecycle handle; fails on a duplicate id or name.
    pub fn add<T: Task>(
        &mut self,
        task: T,
        settings: TaskSettings,
        explicit_stop: bool,
    ) -> Result<Arc<TaskLifecycle<T>>, ControlError> {
        if self.entries.iter().any(|e| e.handle.id() == settings.id) {
            return Err(ControlError::InvalidParameter {
                reason: format!("duplicate task id {}", settings.id),
            });
        }
        if self.entries.iter().any(|e| e.handle.name() == task.name()) {
            return Err(ControlError::InvalidParameter {
                reason: format!("duplicate task name '{}'", task.name()),
            });
        }

        let deps = TaskDeps {
            link: Arc::clone(&self.link),
            bus: self.bus.clone(),
            progress: Arc::clone(&self.progress),
            shutdown: if explicit_stop {
                CancellationToken::new()
            } else {
                self.shutdown.child_token()
            },
            serial: Arc::clone(&self.serial),
        };

        let lifecycle = Arc::new(TaskLifecycle::new(task, settings, deps));
        self.entries.push(Entry {
            handle: Arc::clone(&lifecycle) as Arc<dyn TaskHandle>,
            explicit_stop,
        });
        Ok(lifecycle)
    }

    /// Looks up a task's entry points by id.
    pub fn lookup(&self, id: TaskId) -> Option<Arc<dyn TaskHandle>> {
        self.entries
            .iter()
            .find(|entry| entry.handle.id() == id)
            .map(|entry| Arc::clone(&entry.handle))
    }

    fn resolve(&self, id: TaskId) -> Result<Arc<dyn TaskHandle>, ControlError> {
        self.lookup(id)
            .ok_or(ControlError::UnknownTask { id: id.0 })
    }

    /// Initialises every registered task, in registration order.
    ///
    /// A failing init is fatal to that task only: remaining entries still
    /// initialise, and the first error is returned to the caller to decide
    /// whether startup may proceed.
    pub async fn init_all(&self) -> Result<(), ControlError> {
        let mut first_error = None;
        for entry in &self.entries {
            if let Err(err) = entry.handle.init().await {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Initialises a single task.
    pub async fn init_task(&self, id: TaskId) -> Result<(), ControlError> {
        self.resolve(id)?.init().await
    }

    /// Requests a start for a single task.
    pub fn start_task(
        &self,
        id: TaskId,
        params: StartParams,
    ) -> Result<StartOutcome, ControlError> {
        self.resolve(id)?.start(params)
    }

    /// Requests a cooperative stop for a single task.
    pub fn request_stop(&self, id: TaskId) -> Result<(), ControlError> {
        self.resolve(id)?.request_stop()
    }

    /// Requests a stop and blocks until the task's body has exited.
    ///
    /// For the top-level shutdown path only. A task that was never started
    /// (or initialised) is already idle.
    pub async fn stop_and_wait(&self, id: TaskId) -> Result<(), ControlError> {
        let handle = self.resolve(id)?;
        match handle.request_stop() {
            Ok(()) | Err(ControlError::NotInitialized { .. }) => {}
            Err(err) => return Err(err),
        }
        handle.wait_idle().await;
        Ok(())
    }

    /// Blocks until every registered task reports no running body.
    pub async fn wait_for_all(&self) {
        for entry in &self.entries {
            entry.handle.wait_idle().await;
        }
    }

    /// Coordinated shutdown of every task.
    ///
    /// Publishes [`EventKind::ShutdownRequested`], cancels the global token,
    /// and drains within [`RegistryConfig::grace`]. Exceeding the grace
    /// returns [`RuntimeError::GraceExceeded`] naming the tasks still
    /// running; cooperative cancellation cannot force them out.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.shutdown.cancel();

        let drain = async {
            for entry in self.entries.iter().filter(|e| !e.explicit_stop) {
                entry.handle.wait_idle().await;
            }
            for entry in self.entries.iter().filter(|e| e.explicit_stop) {
                match entry.handle.request_stop() {
                    Ok(()) | Err(ControlError::NotInitialized { .. }) => {}
                    Err(_) => {}
                }
                entry.handle.wait_idle().await;
                entry.handle.teardown();
            }
        };

        match time::timeout(self.cfg.grace, drain).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck: Vec<String> = self
                    .entries
                    .iter()
                    .filter(|entry| entry.handle.is_running())
                    .map(|entry| entry.handle.name().to_string())
                    .collect();
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                Err(RuntimeError::GraceExceeded {
                    grace: self.cfg.grace,
                    stuck,
                })
            }
        }
    }

    /// Blocks until the process receives a termination signal, then runs
    /// [`shutdown`](TaskRegistry::shutdown).
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        let _ = wait_for_shutdown_signal().await;
        self.shutdown().await
    }

    /// Closes the subscriber fan-out and waits for its workers to drain.
    ///
    /// Call after [`shutdown`](TaskRegistry::shutdown) when final events must
    /// reach every subscriber before the process exits.
    pub async fn close_subscribers(self) {
        match Arc::try_unwrap(self.subscribers) {
            Ok(set) => set.shutdown().await,
            Err(_still_shared) => {}
        }
    }
}

/// Forwards bus events to the subscriber set, surviving receiver lag.
///
/// Holds the set weakly so [`TaskRegistry::close_subscribers`] can reclaim
/// and drain it; the listener exits once the set is gone.
fn spawn_subscriber_listener(bus: &Bus, subscribers: Weak<SubscriberSet>) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Some(set) = subscribers.upgrade() else { break };
                    set.emit(&event);
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::dwell::DwellBounds;
    use crate::error::TaskError;
    use crate::link::MemoryLink;
    use crate::tasks::command::NoCommand;
    use crate::tasks::task::{RunMode, TaskContext};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct TickerTask {
        name: &'static str,
        cooperative: bool,
        cycles: AtomicU32,
    }

    impl TickerTask {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                cooperative: true,
                cycles: AtomicU32::new(0),
            }
        }

        fn stubborn(name: &'static str) -> Self {
            Self {
                name,
                cooperative: false,
                cycles: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Task for TickerTask {
        type Command = NoCommand;

        fn name(&self) -> &str {
            self.name
        }

        fn mode(&self) -> RunMode {
            RunMode::Periodic
        }

        async fn run_unit(
            &self,
            _ctx: &TaskContext,
            stop: &tokio_util::sync::CancellationToken,
        ) -> Result<(), TaskError> {
            self.cycles.fetch_add(1, Ordering::SeqCst);
            if self.cooperative {
                tokio::select! {
                    () = tokio::time::sleep(Duration::from_millis(2)) => Ok(()),
                    () = stop.cancelled() => Err(TaskError::Canceled),
                }
            } else {
                // Ignores the stop token entirely; a liveness bug this layer
                // can only report, not fix.
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }

        async fn on_command(
            &self,
            command: NoCommand,
            _ctx: &TaskContext,
        ) -> Result<(), TaskError> {
            match command {}
        }
    }

    fn fast_settings(id: u16) -> TaskSettings {
        TaskSettings::new(TaskId(id)).with_dwell(DwellBounds {
            min: Duration::from_millis(5),
            max: Duration::from_secs(60),
            default: Duration::from_millis(10),
        })
    }

    fn registry(grace: Duration) -> TaskRegistry {
        let cfg = RegistryConfig {
            grace,
            ..RegistryConfig::default()
        };
        TaskRegistry::new(cfg, Vec::new(), Arc::new(MemoryLink::new()))
    }

    #[tokio::test]
    async fn duplicate_ids_and_names_are_rejected() {
        let mut reg = registry(Duration::from_secs(5));
        reg.add(TickerTask::new("A"), fast_settings(1), false)
            .expect("first add");

        let dup_id = reg.add(TickerTask::new("B"), fast_settings(1), false);
        assert!(matches!(
            dup_id,
            Err(ControlError::InvalidParameter { .. })
        ));

        let dup_name = reg.add(TickerTask::new("A"), fast_settings(2), false);
        assert!(matches!(
            dup_name,
            Err(ControlError::InvalidParameter { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let reg = registry(Duration::from_secs(5));
        let err = reg
            .start_task(TaskId(9), StartParams::default())
            .expect_err("unknown id must fail");
        assert_eq!(err, ControlError::UnknownTask { id: 9 });
    }

    #[tokio::test]
    async fn bulk_init_then_start_stop_round_trip() {
        let mut reg = registry(Duration::from_secs(5));
        let a = reg
            .add(TickerTask::new("A"), fast_settings(1), false)
            .expect("add A");
        reg.add(TickerTask::new("B"), fast_settings(2), false)
            .expect("add B");

        reg.init_all().await.expect("all inits succeed");
        assert!(a.is_initialized());

        let outcome = reg
            .start_task(TaskId(1), StartParams::default())
            .expect("start A");
        assert_eq!(outcome, StartOutcome::Requested);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(a.is_running());
        assert!(a.task().cycles.load(Ordering::SeqCst) >= 1);

        reg.stop_and_wait(TaskId(1)).await.expect("stop A");
        assert!(!a.is_running());
    }

    #[tokio::test]
    async fn shutdown_unwinds_all_tasks_within_grace() {
        let mut reg = registry(Duration::from_secs(5));
        let a = reg
            .add(TickerTask::new("A"), fast_settings(1), false)
            .expect("add A");
        let b = reg
            .add(TickerTask::new("B"), fast_settings(2), true)
            .expect("add B (explicit stop)");

        reg.init_all().await.expect("init");
        reg.start_task(TaskId(1), StartParams::default())
            .expect("start A");
        reg.start_task(TaskId(2), StartParams::default())
            .expect("start B");
        tokio::time::sleep(Duration::from_millis(50)).await;

        reg.shutdown().await.expect("graceful shutdown");
        assert!(!a.is_running());
        assert!(!b.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stubborn_body_is_reported_as_stuck() {
        let mut reg = registry(Duration::from_secs(2));
        reg.add(TickerTask::stubborn("Stuck"), fast_settings(1), false)
            .expect("add");
        reg.add(TickerTask::new("Fine"), fast_settings(2), false)
            .expect("add");

        reg.init_all().await.expect("init");
        reg.start_task(TaskId(1), StartParams::default())
            .expect("start stuck");
        reg.start_task(TaskId(2), StartParams::default())
            .expect("start fine");
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = reg.shutdown().await.expect_err("grace must be exceeded");
        match err {
            RuntimeError::GraceExceeded { stuck, .. } => {
                assert_eq!(stuck, vec!["Stuck".to_string()]);
            }
        }
    }

    #[tokio::test]
    async fn progress_marks_surface_through_the_registry() {
        let mut reg = registry(Duration::from_secs(5));
        reg.add(TickerTask::new("A"), fast_settings(1), false)
            .expect("add");

        reg.init_all().await.expect("init");
        reg.start_task(TaskId(1), StartParams::default())
            .expect("start");
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(reg.progress().last_progress("A").await.is_some());
        reg.stop_and_wait(TaskId(1)).await.expect("stop");
    }
}
