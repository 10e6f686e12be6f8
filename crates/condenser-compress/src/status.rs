//! Status notifications pushed back to the chat host

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub description: String,
    pub done: bool,
}

/// Event sent to the host; serializes as `{"type": "status", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum HostEvent {
    Status(StatusUpdate),
}

/// Fire-and-forget sender for host events
#[derive(Debug, Clone)]
pub struct StatusSender {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl StatusSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn status(&self, description: impl Into<String>, done: bool) {
        let event = HostEvent::Status(StatusUpdate {
            description: description.into(),
            done,
        });
        if self.tx.send(event).is_err() {
            tracing::debug!("status receiver dropped, notification discarded");
        }
    }
}
