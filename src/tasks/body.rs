//! # Body execution: one periodic loop or one-shot unit.
//!
//! Runs a task's body under its guard, publishing lifecycle events. Body
//! errors stop here: a failed cycle is reported and the loop continues; only
//! a fatal error or a stop request ends the body.
//!
//! ## Event flow
//! ```text
//! TaskStarting → [unit under guard] ─ Ok          → dwell → next cycle
//!                                   ─ Fail        → CycleFailed → dwell → next cycle
//!                                   ─ Fatal       → CycleFailed → exit
//!                                   ─ Canceled    → exit
//!              ... stop requested during dwell    → exit
//! → on_stopped() → TaskStopped
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::control::dwell::{DwellOutcome, dwell};
use crate::error::TaskError;
use crate::events::{Event, EventKind};

use super::task::{Task, TaskContext};

/// Runs a periodic loop until stopped or fatally failed.
pub(crate) async fn run_periodic<T: Task>(
    task: Arc<T>,
    ctx: Arc<TaskContext>,
    stop: CancellationToken,
) {
    ctx.bus()
        .publish(Event::new(EventKind::TaskStarting).with_task(ctx.name()));

    loop {
        if stop.is_cancelled() {
            break;
        }

        ctx.mark_progress().await;
        if !run_unit_guarded(task.as_ref(), &ctx, &stop).await {
            break;
        }

        if dwell(ctx.dwell().get(), &stop).await == DwellOutcome::Interrupted {
            break;
        }
    }

    finalize(task.as_ref(), &ctx);
}

/// Runs a single unit of work for a one-shot task.
pub(crate) async fn run_one_shot<T: Task>(
    task: Arc<T>,
    ctx: Arc<TaskContext>,
    stop: CancellationToken,
) {
    ctx.bus()
        .publish(Event::new(EventKind::TaskStarting).with_task(ctx.name()));

    ctx.mark_progress().await;
    run_unit_guarded(task.as_ref(), &ctx, &stop).await;

    finalize(task.as_ref(), &ctx);
}

/// Executes one unit under the guard. Returns whether a periodic loop should
/// continue.
async fn run_unit_guarded<T: Task>(task: &T, ctx: &TaskContext, stop: &CancellationToken) -> bool {
    let permit = match ctx.guard().hold().await {
        Ok(permit) => permit,
        Err(err) => {
            ctx.bus().publish(
                Event::new(EventKind::CycleFailed)
                    .with_task(ctx.name())
                    .with_reason(err.to_string()),
            );
            return false;
        }
    };

    let result = task.run_unit(ctx, stop).await;
    drop(permit);

    match result {
        Ok(()) => true,
        Err(TaskError::Canceled) => false,
        Err(err @ TaskError::Fail { .. }) => {
            ctx.bus().publish(
                Event::new(EventKind::CycleFailed)
                    .with_task(ctx.name())
                    .with_reason(err.to_string()),
            );
            true
        }
        Err(err) => {
            ctx.bus().publish(
                Event::new(EventKind::CycleFailed)
                    .with_task(ctx.name())
                    .with_reason(err.to_string()),
            );
            false
        }
    }
}

fn finalize<T: Task>(task: &T, ctx: &TaskContext) {
    task.on_stopped();
    ctx.bus()
        .publish(Event::new(EventKind::TaskStopped).with_task(ctx.name()));
}
