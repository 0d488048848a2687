//! # TaskLifecycle: the init/start/stop state machine for one task.
//!
//! One `TaskLifecycle` owns everything runtime about a task: its guard, its
//! command queue and consumer, its run handle, and the initialized flag. The
//! state machine is:
//!
//! ```text
//! Uninitialized ──init──► Initialized ──start──► Running
//!                              ▲                    │ stop requested
//!                              │                    ▼
//!                              └──── body exits ── StopRequested
//! ```
//!
//! Stop always returns the task to `Initialized`, so it can be restarted.
//!
//! ## Rules
//! - The guard and queue are created exactly once, at init, never recreated.
//! - The run handle is `Some` exactly while a body executes; a start against
//!   a running periodic task is a warning no-op, never a second body.
//! - A one-shot start while the unit is executing becomes a stop request
//!   (cancel-on-resubmit). Whether a near-simultaneous start/stop pair nets
//!   out to "started" or "cancelled" depends on which context observes the
//!   guard first; callers needing certainty watch the result channel.
//! - Entry points never await the guard or the queue; they enqueue (or
//!   refuse) and return.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{TaskId, TaskSettings};
use crate::control::dwell::DwellTime;
use crate::control::guard::ExecutionGuard;
use crate::control::progress::ProgressTracker;
use crate::control::queue::{self, CommandQueue, CommandSender};
use crate::error::ControlError;
use crate::events::{Bus, Event, EventKind};
use crate::link::{CommandSink, InboundCommand, MessageLink, control_topic};

use super::body;
use super::command::{BindingKind, Command, CommandBinding, CommandParams, StartParams};
use super::task::{RunMode, Task, TaskContext};

/// What a `start` request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A start command was enqueued; the body spawns asynchronously.
    Requested,
    /// The body was already running; nothing was enqueued (warning, not an
    /// error).
    AlreadyRunning,
    /// One-shot task already executing: the start was translated into a stop
    /// request (cancel-on-resubmit).
    CancelRequested,
}

/// Shared collaborators handed to every lifecycle by the registry.
#[derive(Clone)]
pub struct TaskDeps {
    /// Pub/sub transport for results and inbound commands.
    pub link: Arc<dyn MessageLink>,
    /// Event bus for observability.
    pub bus: Bus,
    /// Last-progress tracker (stall health signal).
    pub progress: Arc<ProgressTracker>,
    /// Shutdown token; cancelling it unwinds the body and tears down the
    /// dispatch context.
    pub shutdown: CancellationToken,
    /// Device serial used to derive the results topic.
    pub serial: Arc<str>,
}

/// Type-erased lifecycle entry points, as stored by the registry.
#[async_trait]
pub trait TaskHandle: Send + Sync + 'static {
    /// Registry-unique id.
    fn id(&self) -> TaskId;

    /// Task name.
    fn name(&self) -> &str;

    /// True once `init` has succeeded.
    fn is_initialized(&self) -> bool;

    /// True while a body is executing.
    fn is_running(&self) -> bool;

    /// One-time setup: guard, queue, consumer, control subscription.
    async fn init(&self) -> Result<(), ControlError>;

    /// Requests a body start (or cancel, for a busy one-shot task).
    fn start(&self, params: StartParams) -> Result<StartOutcome, ControlError>;

    /// Requests a cooperative stop; termination is asynchronous.
    fn request_stop(&self) -> Result<(), ControlError>;

    /// Completes once no body is executing and the guard is released.
    async fn wait_idle(&self);

    /// Cancels the task's shutdown token, unwinding the body and consumer.
    fn teardown(&self);
}

/// Supervises one task instance: state machine, queue consumer, run handle.
pub struct TaskLifecycle<T: Task> {
    inner: Arc<Inner<T>>,
}

struct Inner<T: Task> {
    task: Arc<T>,
    settings: TaskSettings,
    deps: TaskDeps,
    guard: ExecutionGuard,
    ctx: Arc<TaskContext>,
    initialized: AtomicBool,
    init_gate: tokio::sync::Mutex<()>,
    sender: Mutex<Option<CommandSender<Command<T::Command>>>>,
    run: Mutex<Option<RunHandle>>,
    idle: Notify,
}

struct RunHandle {
    stop: CancellationToken,
    _join: JoinHandle<()>,
}

fn lock<'a, V>(mutex: &'a Mutex<V>) -> MutexGuard<'a, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T: Task> TaskLifecycle<T> {
    /// Creates the lifecycle for `task`. No resources are live until
    /// [`init`](TaskLifecycle::init).
    pub fn new(task: T, settings: TaskSettings, deps: TaskDeps) -> Self {
        let task = Arc::new(task);
        let guard = ExecutionGuard::new();
        let ctx = Arc::new(TaskContext::new(
            task.name(),
            &settings,
            &deps,
            guard.clone(),
        ));

        Self {
            inner: Arc::new(Inner {
                task,
                settings,
                deps,
                guard,
                ctx,
                initialized: AtomicBool::new(false),
                init_gate: tokio::sync::Mutex::new(()),
                sender: Mutex::new(None),
                run: Mutex::new(None),
                idle: Notify::new(),
            }),
        }
    }

    /// The supervised task value.
    pub fn task(&self) -> &T {
        &self.inner.task
    }

    /// Registry-unique id.
    pub fn id(&self) -> TaskId {
        self.inner.settings.id
    }

    /// Task name.
    pub fn name(&self) -> &str {
        self.inner.task.name()
    }

    /// Shared dwell interval handle.
    pub fn dwell(&self) -> &DwellTime {
        self.inner.ctx.dwell()
    }

    /// True once `init` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::Acquire)
    }

    /// True while a body (periodic loop or one-shot unit) is executing.
    pub fn is_running(&self) -> bool {
        lock(&self.inner.run).is_some()
    }

    /// One-time setup.
    ///
    /// Creates the command queue, spawns the consumer, and registers the
    /// task's command bindings on its control topic. Fails with
    /// [`ControlError::AlreadyInitialized`] on a second call; on any sub-step
    /// failure the task stays uninitialised.
    pub async fn init(&self) -> Result<(), ControlError> {
        let inner = &self.inner;
        let _gate = inner.init_gate.lock().await;

        if inner.initialized.load(Ordering::Acquire) {
            return Err(ControlError::AlreadyInitialized {
                task: inner.task.name().to_string(),
            });
        }

        let (tx, rx) = queue::channel(inner.task.name(), inner.settings.queue_capacity);
        let consumer = tokio::spawn(consume(Arc::clone(inner), rx));
        *lock(&inner.sender) = Some(tx);

        let bindings = inner.task.bindings();
        let weak: Weak<Inner<T>> = Arc::downgrade(inner);
        let sink: CommandSink = Arc::new(move |command: InboundCommand| {
            if let Some(strong) = weak.upgrade() {
                strong.dispatch_inbound(&bindings, command);
            }
        });

        let topic = control_topic(inner.task.name());
        if let Err(err) = inner.deps.link.subscribe(&topic, sink).await {
            lock(&inner.sender).take();
            consumer.abort();
            return Err(ControlError::Unknown {
                reason: format!("control subscription failed: {err}"),
            });
        }

        inner.initialized.store(true, Ordering::Release);
        inner.deps.bus.publish(
            Event::new(EventKind::TaskInitialized).with_task(inner.task.name()),
        );
        Ok(())
    }

    /// Requests a body start. Never blocks.
    ///
    /// - Not initialised → [`ControlError::NotInitialized`].
    /// - Periodic and already running → [`StartOutcome::AlreadyRunning`]
    ///   (success-with-warning; no second body).
    /// - One-shot with the unit executing → a stop is enqueued instead
    ///   ([`StartOutcome::CancelRequested`]).
    /// - Otherwise a start command is enqueued ([`StartOutcome::Requested`]).
    pub fn start(&self, params: StartParams) -> Result<StartOutcome, ControlError> {
        self.inner.start(params)
    }

    /// Requests a cooperative stop. Idempotent; returns immediately.
    ///
    /// Termination is asynchronous: observe it through
    /// [`is_running`](TaskLifecycle::is_running),
    /// [`wait_idle`](TaskLifecycle::wait_idle), or the task's `on_stopped`
    /// hook.
    pub fn request_stop(&self) -> Result<(), ControlError> {
        self.inner.request_stop()
    }

    /// Completes once no body is executing and the guard is released.
    ///
    /// Intended for the top-level shutdown path.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if lock(&self.inner.run).is_none() {
                break;
            }
            notified.await;
        }
        self.inner.guard.wait_released().await;
    }

    /// Cancels this task's shutdown token: the body unwinds and the dispatch
    /// context exits. The lifecycle cannot be restarted afterwards.
    pub fn teardown(&self) {
        self.inner.deps.shutdown.cancel();
    }
}

impl<T: Task> Inner<T> {
    fn start(&self, params: StartParams) -> Result<StartOutcome, ControlError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(ControlError::NotInitialized {
                task: self.task.name().to_string(),
            });
        }

        match self.task.mode() {
            RunMode::OneShot if self.guard.is_held() => {
                self.send(Command::Stop)?;
                self.deps.bus.publish(
                    Event::new(EventKind::StopRequested)
                        .with_task(self.task.name())
                        .with_reason("cancelled by resubmitted start"),
                );
                Ok(StartOutcome::CancelRequested)
            }
            RunMode::Periodic if lock(&self.run).is_some() => {
                self.deps.bus.publish(
                    Event::new(EventKind::StartIgnored)
                        .with_task(self.task.name())
                        .with_reason("already running"),
                );
                Ok(StartOutcome::AlreadyRunning)
            }
            _ => {
                self.send(Command::Start(params))?;
                Ok(StartOutcome::Requested)
            }
        }
    }

    fn request_stop(&self) -> Result<(), ControlError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(ControlError::NotInitialized {
                task: self.task.name().to_string(),
            });
        }

        self.deps
            .bus
            .publish(Event::new(EventKind::StopRequested).with_task(self.task.name()));
        self.cancel_run();
        Ok(())
    }

    fn send(&self, command: Command<T::Command>) -> Result<(), ControlError> {
        match lock(&self.sender).as_ref() {
            Some(tx) => tx.send(command),
            None => Err(ControlError::NotInitialized {
                task: self.task.name().to_string(),
            }),
        }
    }

    fn cancel_run(&self) {
        if let Some(handle) = lock(&self.run).as_ref() {
            handle.stop.cancel();
        }
    }

    fn clear_run(&self) {
        lock(&self.run).take();
        self.idle.notify_waiters();
    }

    /// Maps an inbound text command onto its bound variant and enqueues it.
    /// Unknown names are logged and dropped; they are never fatal.
    fn dispatch_inbound(&self, bindings: &[CommandBinding<T::Command>], command: InboundCommand) {
        let Some(binding) = bindings.iter().find(|b| b.name == command.name) else {
            self.deps.bus.publish(
                Event::new(EventKind::CommandUnknown)
                    .with_task(self.task.name())
                    .with_reason(command.name),
            );
            return;
        };

        let params = CommandParams::new(command.params);
        let result = match &binding.kind {
            BindingKind::Start => self
                .start(StartParams {
                    dwell: params.duration_secs_at(0),
                })
                .map(|_| ()),
            BindingKind::Stop => self.request_stop(),
            BindingKind::Custom(build) => match build(&params) {
                Some(custom) => self.send(Command::Custom(custom)),
                None => Err(ControlError::InvalidParameter {
                    reason: format!("unusable parameters for '{}'", command.name),
                }),
            },
        };

        if let Err(err) = result {
            self.deps.bus.publish(
                Event::new(EventKind::CommandRejected)
                    .with_task(self.task.name())
                    .with_reason(err.to_string()),
            );
        }
    }
}

/// Spawns the body for a start command, enforcing the run-handle invariant.
///
/// The run slot is written under its lock before the spawned body can reach
/// its own clearing step, so the slot is `Some` exactly while the body runs.
fn spawn_body<T: Task>(inner: &Arc<Inner<T>>, params: StartParams) {
    if let Some(dwell) = params.dwell {
        inner.ctx.dwell().set(dwell);
    }

    let mut run = lock(&inner.run);
    if run.is_some() {
        match inner.task.mode() {
            // Consumer-side arm of the toggle race: a start that raced a
            // still-running one-shot unit converts into a cancel here.
            RunMode::OneShot => {
                if let Some(handle) = run.as_ref() {
                    handle.stop.cancel();
                }
            }
            RunMode::Periodic => {
                inner.deps.bus.publish(
                    Event::new(EventKind::StartIgnored)
                        .with_task(inner.task.name())
                        .with_reason("already running"),
                );
            }
        }
        return;
    }

    let stop = inner.deps.shutdown.child_token();
    let body_stop = stop.clone();
    let me = Arc::clone(inner);
    let join = tokio::spawn(async move {
        match me.task.mode() {
            RunMode::Periodic => {
                body::run_periodic(Arc::clone(&me.task), Arc::clone(&me.ctx), body_stop).await;
            }
            RunMode::OneShot => {
                body::run_one_shot(Arc::clone(&me.task), Arc::clone(&me.ctx), body_stop).await;
            }
        }
        me.clear_run();
    });

    *run = Some(RunHandle { stop, _join: join });
}

/// The task's dispatch context: drains the command queue in FIFO order.
///
/// Pure dispatch — every arm either spawns the body, cancels the run token,
/// tears down, or hands off to the task's own handler.
async fn consume<T: Task>(inner: Arc<Inner<T>>, mut rx: CommandQueue<Command<T::Command>>) {
    loop {
        tokio::select! {
            () = inner.deps.shutdown.cancelled() => {
                inner.cancel_run();
                break;
            }
            message = rx.recv() => match message {
                None => break,
                Some(Command::Start(params)) => spawn_body(&inner, params),
                Some(Command::Stop) => inner.cancel_run(),
                Some(Command::Shutdown) => {
                    inner.cancel_run();
                    break;
                }
                Some(Command::Custom(custom)) => {
                    if let Err(err) = inner.task.on_command(custom, &inner.ctx).await {
                        inner.deps.bus.publish(
                            Event::new(EventKind::CommandFailed)
                                .with_task(inner.task.name())
                                .with_reason(err.to_string()),
                        );
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<T: Task> TaskHandle for TaskLifecycle<T> {
    fn id(&self) -> TaskId {
        TaskLifecycle::id(self)
    }

    fn name(&self) -> &str {
        TaskLifecycle::name(self)
    }

    fn is_initialized(&self) -> bool {
        TaskLifecycle::is_initialized(self)
    }

    fn is_running(&self) -> bool {
        TaskLifecycle::is_running(self)
    }

    async fn init(&self) -> Result<(), ControlError> {
        TaskLifecycle::init(self).await
    }

    fn start(&self, params: StartParams) -> Result<StartOutcome, ControlError> {
        TaskLifecycle::start(self, params)
    }

    fn request_stop(&self) -> Result<(), ControlError> {
        TaskLifecycle::request_stop(self)
    }

    async fn wait_idle(&self) {
        TaskLifecycle::wait_idle(self).await;
    }

    fn teardown(&self) {
        TaskLifecycle::teardown(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskId;
    use crate::control::dwell::DwellBounds;
    use crate::error::TaskError;
    use crate::link::MemoryLink;
    use std::sync::atomic::{AtomicBool, AtomicU32};
    use std::time::Duration;
    use tokio::time::timeout;

    #[derive(Debug, Clone, Copy)]
    enum ProbeCommand {
        Record(u32),
    }

    struct ProbeTask {
        mode: RunMode,
        unit: Duration,
        runs: AtomicU32,
        active: AtomicU32,
        max_active: AtomicU32,
        stops: AtomicU32,
        saw_cancel: AtomicBool,
        order: Mutex<Vec<u32>>,
    }

    impl ProbeTask {
        fn new(mode: RunMode, unit: Duration) -> Self {
            Self {
                mode,
                unit,
                runs: AtomicU32::new(0),
                active: AtomicU32::new(0),
                max_active: AtomicU32::new(0),
                stops: AtomicU32::new(0),
                saw_cancel: AtomicBool::new(false),
                order: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Task for ProbeTask {
        type Command = ProbeCommand;

        fn name(&self) -> &str {
            "Probe"
        }

        fn mode(&self) -> RunMode {
            self.mode
        }

        fn bindings(&self) -> Vec<CommandBinding<ProbeCommand>> {
            vec![
                CommandBinding::start("START_TASK"),
                CommandBinding::stop("STOP_TASK"),
                CommandBinding::custom("RECORD", |params| {
                    params
                        .get(0)
                        .and_then(|raw| raw.parse().ok())
                        .map(ProbeCommand::Record)
                }),
            ]
        }

        async fn run_unit(
            &self,
            _ctx: &TaskContext,
            stop: &CancellationToken,
        ) -> Result<(), TaskError> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);

            let outcome = tokio::select! {
                () = tokio::time::sleep(self.unit) => Ok(()),
                () = stop.cancelled() => {
                    self.saw_cancel.store(true, Ordering::SeqCst);
                    Err(TaskError::Canceled)
                }
            };

            self.active.fetch_sub(1, Ordering::SeqCst);
            self.runs.fetch_add(1, Ordering::SeqCst);
            outcome
        }

        async fn on_command(
            &self,
            command: ProbeCommand,
            _ctx: &TaskContext,
        ) -> Result<(), TaskError> {
            match command {
                ProbeCommand::Record(value) => {
                    lock(&self.order).push(value);
                    Ok(())
                }
            }
        }

        fn on_stopped(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fast_dwell() -> DwellBounds {
        DwellBounds {
            min: Duration::from_millis(5),
            max: Duration::from_secs(60),
            default: Duration::from_millis(10),
        }
    }

    fn probe_lifecycle(
        mode: RunMode,
        unit: Duration,
        dwell: DwellBounds,
    ) -> (Arc<MemoryLink>, Bus, TaskLifecycle<ProbeTask>) {
        let link = Arc::new(MemoryLink::new());
        let bus = Bus::new(64);
        let deps = TaskDeps {
            link: link.clone() as Arc<dyn MessageLink>,
            bus: bus.clone(),
            progress: Arc::new(ProgressTracker::new()),
            shutdown: CancellationToken::new(),
            serial: Arc::from("0000000000"),
        };
        let settings = TaskSettings::new(TaskId(1)).with_dwell(dwell);
        let lifecycle = TaskLifecycle::new(ProbeTask::new(mode, unit), settings, deps);
        (link, bus, lifecycle)
    }

    async fn expect_event(
        rx: &mut tokio::sync::broadcast::Receiver<Event>,
        kind: EventKind,
    ) -> Event {
        loop {
            let ev = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("event must arrive in time")
                .expect("bus must stay open");
            if ev.kind == kind {
                return ev;
            }
        }
    }

    #[tokio::test]
    async fn start_before_init_is_refused() {
        let (_link, _bus, lifecycle) =
            probe_lifecycle(RunMode::Periodic, Duration::from_millis(5), fast_dwell());

        let err = lifecycle
            .start(StartParams::default())
            .expect_err("uninitialised start must fail");
        assert!(matches!(err, ControlError::NotInitialized { .. }));
        assert!(!lifecycle.is_running());
    }

    #[tokio::test]
    async fn init_is_one_time_only() {
        let (_link, _bus, lifecycle) =
            probe_lifecycle(RunMode::Periodic, Duration::from_millis(5), fast_dwell());

        lifecycle.init().await.expect("first init succeeds");
        assert!(lifecycle.is_initialized());

        let err = lifecycle.init().await.expect_err("second init must fail");
        assert!(matches!(err, ControlError::AlreadyInitialized { .. }));
        assert!(lifecycle.is_initialized());
    }

    #[tokio::test]
    async fn periodic_task_starts_cycles_and_stops() {
        let (_link, _bus, lifecycle) =
            probe_lifecycle(RunMode::Periodic, Duration::from_millis(2), fast_dwell());

        lifecycle.init().await.expect("init");
        let outcome = lifecycle.start(StartParams::default()).expect("start");
        assert_eq!(outcome, StartOutcome::Requested);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(lifecycle.is_running());
        assert!(lifecycle.task().runs.load(Ordering::SeqCst) >= 2);

        lifecycle.request_stop().expect("stop");
        timeout(Duration::from_secs(2), lifecycle.wait_idle())
            .await
            .expect("body must exit promptly");

        assert!(!lifecycle.is_running());
        assert_eq!(lifecycle.task().stops.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.task().max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn restart_after_stop_is_allowed() {
        let (_link, _bus, lifecycle) =
            probe_lifecycle(RunMode::Periodic, Duration::from_millis(2), fast_dwell());

        lifecycle.init().await.expect("init");
        lifecycle.start(StartParams::default()).expect("start");
        tokio::time::sleep(Duration::from_millis(30)).await;
        lifecycle.request_stop().expect("stop");
        timeout(Duration::from_secs(2), lifecycle.wait_idle())
            .await
            .expect("idle");

        let outcome = lifecycle.start(StartParams::default()).expect("restart");
        assert_eq!(outcome, StartOutcome::Requested);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(lifecycle.is_running());

        lifecycle.request_stop().expect("stop again");
        timeout(Duration::from_secs(2), lifecycle.wait_idle())
            .await
            .expect("idle again");
        assert_eq!(lifecycle.task().stops.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_start_of_running_periodic_task_is_a_warning_noop() {
        let (_link, bus, lifecycle) =
            probe_lifecycle(RunMode::Periodic, Duration::from_millis(2), fast_dwell());
        let mut rx = bus.subscribe();

        lifecycle.init().await.expect("init");
        lifecycle.start(StartParams::default()).expect("start");
        tokio::time::sleep(Duration::from_millis(30)).await;

        let outcome = lifecycle.start(StartParams::default()).expect("resubmit");
        assert_eq!(outcome, StartOutcome::AlreadyRunning);
        let ev = expect_event(&mut rx, EventKind::StartIgnored).await;
        assert_eq!(ev.task.as_deref(), Some("Probe"));
        assert_eq!(lifecycle.task().max_active.load(Ordering::SeqCst), 1);

        lifecycle.request_stop().expect("stop");
        lifecycle.wait_idle().await;
    }

    #[tokio::test]
    async fn one_shot_start_while_busy_becomes_a_cancel() {
        let (_link, _bus, lifecycle) =
            probe_lifecycle(RunMode::OneShot, Duration::from_millis(500), fast_dwell());

        lifecycle.init().await.expect("init");
        let first = lifecycle.start(StartParams::default()).expect("start");
        assert_eq!(first, StartOutcome::Requested);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(lifecycle.is_running());

        let second = lifecycle.start(StartParams::default()).expect("resubmit");
        assert_eq!(second, StartOutcome::CancelRequested);

        timeout(Duration::from_secs(2), lifecycle.wait_idle())
            .await
            .expect("cancelled unit must exit");

        let task = lifecycle.task();
        assert_eq!(task.runs.load(Ordering::SeqCst), 1);
        assert!(task.saw_cancel.load(Ordering::SeqCst));
        assert_eq!(task.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn inbound_commands_dispatch_in_fifo_order() {
        let (link, _bus, lifecycle) =
            probe_lifecycle(RunMode::Periodic, Duration::from_millis(2), fast_dwell());

        lifecycle.init().await.expect("init");
        for value in 1..=5u32 {
            link.inject(
                "ProbeControl",
                InboundCommand::with_params("RECORD", vec![value.to_string()]),
            );
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*lock(&lifecycle.task().order), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn inbound_start_applies_clamped_dwell_override() {
        let (link, _bus, lifecycle) =
            probe_lifecycle(RunMode::Periodic, Duration::from_millis(2), fast_dwell());

        lifecycle.init().await.expect("init");
        link.inject(
            "ProbeControl",
            InboundCommand::with_params("START_TASK", vec!["90".into()]),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        // 90s exceeds the bound; the override clamps to max.
        assert_eq!(lifecycle.dwell().get(), Duration::from_secs(60));
        assert!(lifecycle.is_running());

        link.inject("ProbeControl", InboundCommand::bare("STOP_TASK"));
        timeout(Duration::from_secs(2), lifecycle.wait_idle())
            .await
            .expect("inbound stop must land");
    }

    #[tokio::test]
    async fn unknown_inbound_commands_are_dropped_with_an_event() {
        let (link, bus, lifecycle) =
            probe_lifecycle(RunMode::Periodic, Duration::from_millis(2), fast_dwell());
        let mut rx = bus.subscribe();

        lifecycle.init().await.expect("init");
        link.inject("ProbeControl", InboundCommand::bare("FORMAT_DISK"));

        let ev = expect_event(&mut rx, EventKind::CommandUnknown).await;
        assert_eq!(ev.reason.as_deref(), Some("FORMAT_DISK"));
        assert!(!lifecycle.is_running());
    }

    #[tokio::test]
    async fn teardown_closes_the_command_queue() {
        let (_link, _bus, lifecycle) =
            probe_lifecycle(RunMode::Periodic, Duration::from_millis(2), fast_dwell());

        lifecycle.init().await.expect("init");
        lifecycle.teardown();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = lifecycle
            .start(StartParams::default())
            .expect_err("start after teardown must fail");
        assert!(matches!(err, ControlError::QueueClosed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_lands_within_one_dwell_check_not_one_interval() {
        let (_link, _bus, lifecycle) = probe_lifecycle(
            RunMode::Periodic,
            Duration::ZERO,
            DwellBounds {
                min: Duration::from_secs(5),
                max: Duration::from_secs(60),
                default: Duration::from_secs(5),
            },
        );

        lifecycle.init().await.expect("init");
        lifecycle.start(StartParams::default()).expect("start");
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(lifecycle.is_running());

        let started = tokio::time::Instant::now();
        let stopper = lifecycle.inner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = stopper.request_stop();
        });

        lifecycle.wait_idle().await;
        // Dwell is 5s; the stop at t=1s must not wait out the interval.
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
