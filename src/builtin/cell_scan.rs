//! # Network-scan task.
//!
//! One-shot `+COPS=?`-style operator scan. Each operator is published as it
//! is found, followed by one summary line:
//!
//! ```text
//! Cell Scan Result: found 'Operator A', MCC/MNC: 26201
//! Cell Scan Result: 2 network(s) found in total.
//! ```
//!
//! A scan takes minutes on real hardware, so the single control command
//! toggles: `START_CELL_SCAN` starts a scan when idle and cancels the one in
//! flight otherwise (cancel-on-resubmit). A cancelled scan reports
//! `Cell Scan Result: Cancelled.` and counts as a graceful exit.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::control::status::{AppStatus, StatusRegister};
use crate::error::TaskError;
use crate::radio::Radio;
use crate::tasks::{CommandBinding, NoCommand, RunMode, Task, TaskContext};

/// One-shot operator scan over a [`Radio`].
pub struct CellScanTask {
    radio: Arc<dyn Radio>,
}

impl CellScanTask {
    /// Creates the task over the given modem interface.
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self { radio }
    }

    async fn scan(&self, ctx: &TaskContext, stop: &CancellationToken) -> Result<(), TaskError> {
        let mut results = self.radio.scan_networks();
        let mut found: u32 = 0;
        let mut cancelled = false;
        let mut failure: Option<TaskError> = None;

        loop {
            tokio::select! {
                () = stop.cancelled() => {
                    cancelled = true;
                    break;
                }
                next = results.next() => match next {
                    None => break,
                    Some(Ok(network)) => {
                        found += 1;
                        ctx.publish(&format!(
                            "Cell Scan Result: found '{}', MCC/MNC: {}",
                            network.operator_name, network.mcc_mnc
                        ))
                        .await;
                    }
                    Some(Err(err)) => {
                        failure = Some(err);
                        break;
                    }
                }
            }
        }
        drop(results);

        let summary = if cancelled {
            "Cell Scan Result: Cancelled.".to_string()
        } else if let Some(err) = &failure {
            format!("Cell Scan Result: Error: {err}")
        } else if found == 0 {
            "Cell Scan Result: No network operators found.".to_string()
        } else {
            format!("Cell Scan Result: {found} network(s) found in total.")
        };
        ctx.publish(&summary).await;

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Task for CellScanTask {
    type Command = NoCommand;

    fn name(&self) -> &str {
        "CellScan"
    }

    fn mode(&self) -> RunMode {
        RunMode::OneShot
    }

    fn bindings(&self) -> Vec<CommandBinding<NoCommand>> {
        vec![CommandBinding::start("START_CELL_SCAN")]
    }

    async fn run_unit(
        &self,
        ctx: &TaskContext,
        stop: &CancellationToken,
    ) -> Result<(), TaskError> {
        let status = StatusRegister::global();
        status.set(AppStatus::NetworkScan);
        let outcome = self.scan(ctx, stop).await;
        status.revert();
        outcome
    }

    async fn on_command(&self, command: NoCommand, _ctx: &TaskContext) -> Result<(), TaskError> {
        match command {}
    }
}
