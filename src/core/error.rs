//! Error types for dispatch operations.

use thiserror::Error;

use crate::core::message::MessageKind;
use crate::util::serde::Endpoint;

/// Errors produced by dispatch components.
///
/// A station finding no eligible device is not an error: it is handled by the
/// escalation cascade and surfaces only as protocol messages.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The cloud server has no network identity yet.
    #[error("cloud server network is not initialized")]
    CloudNotInitialized,
    /// The station is already linked to a cloud endpoint.
    #[error("station {0} is already linked to a cloud server")]
    CloudAlreadyLinked(Endpoint),
    /// The station was used before `link_cloud`.
    #[error("station {0} is not linked to a cloud server")]
    CloudNotLinked(Endpoint),
    /// Indexed access beyond the station set.
    #[error("index out of range: {index} (len {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of stations.
        len: usize,
    },
    /// No handler is registered for the message kind.
    #[error("no handler registered for {0}")]
    NoHandler(MessageKind),
    /// Destination endpoint is not known to the transport.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(Endpoint),
    /// Task descriptor failed validation.
    #[error("invalid task: {0}")]
    InvalidTask(String),
    /// Message frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
    /// Transport-specific failure with context.
    #[error("transport error: {0}")]
    Transport(String),
    /// Configuration failed validation.
    #[error("config invalid: {0}")]
    Config(String),
    /// Simulation did not quiesce within the step budget.
    #[error("step limit exceeded: {0}")]
    StepLimitExceeded(usize),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
