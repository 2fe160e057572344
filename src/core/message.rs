//! Message envelope and its wire framing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{DispatchError, Task};

/// Closed set of message kinds exchanged during a dispatch cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Initial dispatch from the cloud to a station.
    DispatchRequest,
    /// Execute the task; addressed to a device or, as a last resort, the cloud.
    HandleRequest,
    /// Station placed the task locally.
    DispatchSucceeded,
    /// Station could not place the task locally.
    DispatchFailed,
    /// Peer-initiated re-offload between stations.
    OffloadRequest,
}

impl MessageKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DispatchRequest => "dispatch_request",
            Self::HandleRequest => "handle_request",
            Self::DispatchSucceeded => "dispatch_succeeded",
            Self::DispatchFailed => "dispatch_failed",
            Self::OffloadRequest => "offload_request",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope holding exactly one task and one kind.
///
/// The envelope lives for one hop: a receiver inspects it, possibly re-tags
/// it, and sends it on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    kind: MessageKind,
    task: Task,
}

impl Message {
    /// Wrap a task in an envelope.
    #[must_use]
    pub const fn new(kind: MessageKind, task: Task) -> Self {
        Self { kind, task }
    }

    /// Current kind.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Re-tag the envelope.
    pub fn set_kind(&mut self, kind: MessageKind) {
        self.kind = kind;
    }

    /// Carried task.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Consume the envelope and return its task.
    #[must_use]
    pub fn into_task(self) -> Task {
        self.task
    }

    /// Encode into a JSON frame.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Codec`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DispatchError> {
        serde_json::to_vec(self).map_err(|e| DispatchError::Codec(e.to_string()))
    }

    /// Decode a JSON frame. The carried task is validated.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Codec`] for malformed frames and
    /// [`DispatchError::InvalidTask`] for frames carrying an invalid task.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DispatchError> {
        let msg: Self =
            serde_json::from_slice(bytes).map_err(|e| DispatchError::Codec(e.to_string()))?;
        msg.task.validate()?;
        Ok(msg)
    }
}
