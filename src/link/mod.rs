//! Message-link seam: the narrow interface to the pub/sub transport.
//!
//! The control layer publishes result payloads and receives inbound text
//! commands through [`MessageLink`]. The wire format and the broker itself
//! are out of scope; an implementation adapts whatever transport the
//! application uses. [`MemoryLink`] is an in-process implementation for
//! tests and demos.
//!
//! ## Topics
//! - Results: `"<serial>/<TaskName>"` ([`results_topic`]).
//! - Control: `"<TaskName>Control"` ([`control_topic`]).
//!
//! ## Delivery
//! Results are published at-most-once. A failed publish is reported to the
//! event bus and never retried by this layer.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{MemoryLink, SentMessage};

/// Delivery quality requested for a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qos {
    /// Fire and forget.
    AtMostOnce,
    /// Broker-acknowledged; unused by the control layer itself.
    AtLeastOnce,
}

/// An inbound text command, already tokenized by the transport layer.
///
/// Parameter *parsing* (types, ranges) happens at dispatch; the link only
/// carries the command name and its positional parameters.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    /// Command name, e.g. `MEASURE_NOW`.
    pub name: String,
    /// Positional parameters following the name.
    pub params: Vec<String>,
}

impl InboundCommand {
    /// Creates a command with no parameters.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Creates a command with positional parameters.
    pub fn with_params(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// Callback invoked for each inbound command on a subscribed topic.
///
/// Must not block: implementations enqueue onto the task's command queue and
/// return.
pub type CommandSink = Arc<dyn Fn(InboundCommand) + Send + Sync>;

/// Errors surfaced by a link implementation.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The transport connection is gone.
    #[error("link is closed")]
    Closed,

    /// The transport rejected the operation.
    #[error("link operation failed: {reason}")]
    Failed {
        /// Transport-specific detail.
        reason: String,
    },
}

/// Narrow interface to the pub/sub transport.
#[async_trait]
pub trait MessageLink: Send + Sync + 'static {
    /// Publishes a payload to a topic.
    async fn publish(&self, topic: &str, payload: &str, qos: Qos) -> Result<(), LinkError>;

    /// Registers a sink for inbound commands on a topic.
    async fn subscribe(&self, topic: &str, sink: CommandSink) -> Result<(), LinkError>;
}

/// Results topic for a task: `"<serial>/<TaskName>"`.
pub fn results_topic(serial: &str, task_name: &str) -> String {
    format!("{serial}/{task_name}")
}

/// Control topic for a task: `"<TaskName>Control"`.
pub fn control_topic(task_name: &str) -> String {
    format!("{task_name}Control")
}
