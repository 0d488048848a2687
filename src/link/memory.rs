//! # In-process message link.
//!
//! Routes inbound commands to registered sinks and records every publish, so
//! tests and demos can drive the control layer without a broker.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use super::{CommandSink, InboundCommand, LinkError, MessageLink, Qos};

/// A payload recorded by [`MemoryLink::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Destination topic.
    pub topic: String,
    /// Payload text.
    pub payload: String,
    /// Requested delivery quality.
    pub qos: Qos,
}

/// In-process [`MessageLink`] for tests and demos.
pub struct MemoryLink {
    sinks: RwLock<HashMap<String, Vec<CommandSink>>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl MemoryLink {
    /// Creates an empty link.
    pub fn new() -> Self {
        Self {
            sinks: RwLock::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Delivers an inbound command to every sink subscribed to `topic`.
    pub fn inject(&self, topic: &str, command: InboundCommand) {
        let sinks: Vec<CommandSink> = self
            .sinks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(topic)
            .cloned()
            .unwrap_or_default();
        for sink in sinks {
            sink(command.clone());
        }
    }

    /// Everything published so far, in publish order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Payloads published to `topic`, in publish order.
    pub fn payloads_to(&self, topic: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|msg| msg.topic == topic)
            .map(|msg| msg.payload)
            .collect()
    }
}

impl Default for MemoryLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageLink for MemoryLink {
    async fn publish(&self, topic: &str, payload: &str, qos: Qos) -> Result<(), LinkError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentMessage {
                topic: topic.to_string(),
                payload: payload.to_string(),
                qos,
            });
        Ok(())
    }

    async fn subscribe(&self, topic: &str, sink: CommandSink) -> Result<(), LinkError> {
        self.sinks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(topic.to_string())
            .or_default()
            .push(sink);
        Ok(())
    }
}
