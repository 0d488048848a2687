//! # Signal-quality measurement task.
//!
//! Periodically refreshes the modem's radio parameters and publishes them as
//! a JSON report on the task's results topic:
//!
//! ```text
//! {"Timestamp":"2026-08-07T09:15:02Z",
//!  "CellQuality":{"RSRP":-90,"RSRQ":-10,"RSSI":-65,"RxQual":0,
//!                 "CellID":1234567,"EARFCN":6300}}
//! ```
//!
//! A non-zero RSRP is the working definition of "the network is audible";
//! the task keeps that flag readable for the rest of the application.
//!
//! Control commands: `MEASURE_NOW` (one measurement on demand), `START_TASK`
//! (begin the loop, optional dwell-seconds parameter), `STOP_TASK`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::control::status::{AppStatus, StatusRegister};
use crate::error::TaskError;
use crate::radio::{Radio, RadioParams};
use crate::tasks::{CommandBinding, RunMode, Task, TaskContext};

/// Task-specific operations for [`SignalQualityTask`].
#[derive(Debug, Clone, Copy)]
pub enum SignalQualityCommand {
    /// Measure and publish once, outside the periodic cadence.
    MeasureNow,
}

/// The published report shape.
#[derive(Serialize)]
struct QualityReport {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "CellQuality")]
    cell_quality: RadioParams,
}

/// Periodic signal-quality measurement over a [`Radio`].
pub struct SignalQualityTask {
    radio: Arc<dyn Radio>,
    signal_valid: AtomicBool,
}

impl SignalQualityTask {
    /// Creates the task over the given modem interface.
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self {
            radio,
            signal_valid: AtomicBool::new(false),
        }
    }

    /// True if the last measurement saw a usable network (RSRP ≠ 0).
    pub fn network_signal_valid(&self) -> bool {
        self.signal_valid.load(Ordering::Relaxed)
    }

    /// One measurement: refresh, publish, flag update. Status register is
    /// pushed on entry and reverted on every exit path.
    async fn measure(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        let status = StatusRegister::global();
        status.set(AppStatus::MeasureSignalQuality);

        let outcome = match self.radio.refresh_radio_params().await {
            Ok(params) => {
                self.signal_valid
                    .store(params.rsrp_dbm != 0, Ordering::Relaxed);

                status.replace(AppStatus::SendSignalQuality);
                let report = QualityReport {
                    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                    cell_quality: params,
                };
                match serde_json::to_string(&report) {
                    Ok(payload) => {
                        ctx.publish(&payload).await;
                        Ok(())
                    }
                    Err(err) => Err(TaskError::Fail {
                        error: format!("report serialization failed: {err}"),
                    }),
                }
            }
            Err(err) => Err(TaskError::Fail {
                error: format!("failed to read radio parameters: {err}"),
            }),
        };

        status.revert();
        outcome
    }
}

#[async_trait]
impl Task for SignalQualityTask {
    type Command = SignalQualityCommand;

    fn name(&self) -> &str {
        "SignalQuality"
    }

    fn mode(&self) -> RunMode {
        RunMode::Periodic
    }

    fn bindings(&self) -> Vec<CommandBinding<SignalQualityCommand>> {
        vec![
            CommandBinding::custom("MEASURE_NOW", |_params| {
                Some(SignalQualityCommand::MeasureNow)
            }),
            CommandBinding::start("START_TASK"),
            CommandBinding::stop("STOP_TASK"),
        ]
    }

    async fn run_unit(
        &self,
        ctx: &TaskContext,
        _stop: &CancellationToken,
    ) -> Result<(), TaskError> {
        self.measure(ctx).await
    }

    async fn on_command(
        &self,
        command: SignalQualityCommand,
        ctx: &TaskContext,
    ) -> Result<(), TaskError> {
        match command {
            SignalQualityCommand::MeasureNow => {
                let _permit = ctx.hold_guard().await.map_err(|err| TaskError::Fail {
                    error: err.to_string(),
                })?;
                self.measure(ctx).await
            }
        }
    }
}
