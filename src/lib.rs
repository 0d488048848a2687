//! # taskwarden
//!
//! **Taskwarden** is a task-lifecycle and command-dispatch layer for
//! cooperative, embedded-style controllers written in Rust.
//!
//! Each task is a long-lived unit of periodic or on-demand work (polling a
//! measurement, scanning for networks) that must be startable, stoppable,
//! and mutually exclusive with itself — while staying controllable from
//! other execution contexts (an inbound message callback, a CLI handler)
//! without ever blocking those callers.
//!
//! ## Architecture
//! ```text
//!   inbound command            CLI / application code
//!   (control topic)                     │
//!        │                              ▼
//!        │            ┌─────────────────────────────────┐
//!        └──────────► │  TaskLifecycle (one per task)   │
//!   name→variant      │  - CommandQueue (bounded mpsc)  │──► consumer context
//!   binding table     │  - ExecutionGuard (1 permit)    │      │ dispatch:
//!                     │  - run handle + stop token      │      ├─ spawn body
//!                     │  - initialized flag             │      ├─ cancel run
//!                     └────────────────┬────────────────┘      ├─ teardown
//!                                      │                       └─ on_command()
//!                                      ▼
//!                     ┌─────────────────────────────────┐
//!                     │  body (periodic loop/one-shot)  │
//!                     │  loop {                         │
//!                     │    mark progress                │
//!                     │    run_unit() under guard       │
//!                     │    cancellable dwell            │
//!                     │  }                              │──► results topic
//!                     └────────────────┬────────────────┘    (MessageLink)
//!                                      │ events
//!                                      ▼
//!        Bus ──► subscriber listener ──► SubscriberSet ──► LogWriter, ...
//!
//!   TaskRegistry: ordered set of lifecycles; bulk init, lookup by id,
//!   stop-and-wait, coordinated shutdown with grace (global stop token).
//! ```
//!
//! ## Guarantees
//! - **At most one body per task**: the guard serialises execution units even
//!   when starts race from several contexts.
//! - **Non-blocking control**: `start`/`stop` enqueue or refuse; they never
//!   wait on a guard or a full queue.
//! - **Cooperative cancellation**: a stop request cancels the run token; the
//!   dwell wakes immediately and the loop unwinds. Nothing is ever killed.
//! - **Per-task FIFO**: commands for one task dispatch in order; no ordering
//!   across tasks.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use taskwarden::{
//!     CommandBinding, LogWriter, MemoryLink, NoCommand, RegistryConfig, RunMode,
//!     StartParams, Task, TaskContext, TaskError, TaskId, TaskRegistry, TaskSettings,
//! };
//!
//! struct Ticker;
//!
//! #[async_trait]
//! impl Task for Ticker {
//!     type Command = NoCommand;
//!
//!     fn name(&self) -> &str { "Ticker" }
//!     fn mode(&self) -> RunMode { RunMode::Periodic }
//!
//!     fn bindings(&self) -> Vec<CommandBinding<NoCommand>> {
//!         vec![CommandBinding::start("START_TASK"), CommandBinding::stop("STOP_TASK")]
//!     }
//!
//!     async fn run_unit(
//!         &self,
//!         ctx: &TaskContext,
//!         _stop: &CancellationToken,
//!     ) -> Result<(), TaskError> {
//!         ctx.publish("tick").await;
//!         Ok(())
//!     }
//!
//!     async fn on_command(&self, cmd: NoCommand, _ctx: &TaskContext) -> Result<(), TaskError> {
//!         match cmd {}
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let link = Arc::new(MemoryLink::new());
//!     let mut registry =
//!         TaskRegistry::new(RegistryConfig::default(), vec![Arc::new(LogWriter)], link);
//!
//!     let ticker = registry.add(Ticker, TaskSettings::new(TaskId(1)), false)?;
//!
//!     registry.init_all().await?;
//!     ticker.start(StartParams::with_dwell(Duration::from_secs(5)))?;
//!
//!     registry.run_until_signal().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Built-in tasks
//! [`SignalQualityTask`] (periodic radio measurement) and [`CellScanTask`]
//! (one-shot operator scan with cancel-on-resubmit) consume the modem
//! through the [`Radio`] seam only.

pub mod builtin;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod link;
pub mod radio;
pub mod subscribers;
pub mod tasks;

// ---- Public re-exports ----

pub use builtin::{CellScanTask, SignalQualityCommand, SignalQualityTask};
pub use config::{RegistryConfig, TaskId, TaskSettings};
pub use control::{
    AppStatus, DwellBounds, DwellOutcome, DwellTime, ExecutionGuard, ProgressTracker, RunPermit,
    StatusRegister, dwell,
};
pub use error::{ControlError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use link::{
    CommandSink, InboundCommand, LinkError, MemoryLink, MessageLink, Qos, SentMessage,
    control_topic, results_topic,
};
pub use radio::{NetworkInfo, Radio, RadioParams};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{
    BindingKind, Command, CommandBinding, CommandParams, NoCommand, RunMode, StartOutcome,
    StartParams, Task, TaskContext, TaskDeps, TaskHandle, TaskLifecycle, TaskRegistry,
};
