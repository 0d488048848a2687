//! # Built-in logging subscriber.
//!
//! Renders each event as one human-readable stdout line:
//!
//! ```text
//! [init] task=SignalQuality
//! [starting] task=SignalQuality
//! [stop-requested] task=SignalQuality
//! [stopped] task=SignalQuality
//! [cycle-failed] task=SignalQuality reason="failed to read radio parameters"
//! [shutdown-requested]
//! ```
//!
//! Intended for development and demos; implement [`Subscribe`] for structured
//! logging or metrics.

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Prints events to stdout.
pub struct LogWriter;

impl LogWriter {
    fn line(event: &Event) -> String {
        let tag = match event.kind {
            EventKind::TaskInitialized => "init",
            EventKind::TaskStarting => "starting",
            EventKind::TaskStopped => "stopped",
            EventKind::StartIgnored => "start-ignored",
            EventKind::StopRequested => "stop-requested",
            EventKind::CycleFailed => "cycle-failed",
            EventKind::CommandFailed => "command-failed",
            EventKind::CommandRejected => "command-rejected",
            EventKind::CommandUnknown => "command-unknown",
            EventKind::PublishFailed => "publish-failed",
            EventKind::ShutdownRequested => "shutdown-requested",
            EventKind::AllStoppedWithin => "all-stopped-within-grace",
            EventKind::GraceExceeded => "grace-exceeded",
        };

        let mut line = format!("[{tag}]");
        if let Some(task) = &event.task {
            line.push_str(&format!(" task={task}"));
        }
        if let Some(reason) = &event.reason {
            line.push_str(&format!(" reason={reason:?}"));
        }
        line
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, event: &Event) {
        println!("{}", Self::line(event));
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_task_and_reason() {
        let ev = Event::new(EventKind::CycleFailed)
            .with_task("SignalQuality")
            .with_reason("radio query failed");
        assert_eq!(
            LogWriter::line(&ev),
            "[cycle-failed] task=SignalQuality reason=\"radio query failed\""
        );

        let bare = Event::new(EventKind::ShutdownRequested);
        assert_eq!(LogWriter::line(&bare), "[shutdown-requested]");
    }
}
