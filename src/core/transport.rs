//! Transport abstraction the dispatch core sends messages through.

use crate::core::{DispatchError, Message};
use crate::util::serde::Endpoint;

/// Reliable, in-order, point-to-point delivery of framed messages.
///
/// Implementations decide how frames travel; the core only needs `send`.
pub trait Transport: Send + Sync {
    /// Send `message` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error when the message cannot be framed or the destination
    /// is unreachable.
    fn send(&self, from: Endpoint, to: Endpoint, message: &Message) -> Result<(), DispatchError>;
}

/// A framed message in flight, with transport-supplied addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Sender endpoint.
    pub from: Endpoint,
    /// Destination endpoint.
    pub to: Endpoint,
    /// JSON frame produced by [`Message::to_bytes`].
    pub payload: Vec<u8>,
}

impl Packet {
    /// Frame `message` for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Codec`] if the message cannot be encoded.
    pub fn encode(from: Endpoint, to: Endpoint, message: &Message) -> Result<Self, DispatchError> {
        Ok(Self {
            from,
            to,
            payload: message.to_bytes()?,
        })
    }

    /// Decode the carried message.
    ///
    /// # Errors
    ///
    /// Returns the decoding error from [`Message::from_bytes`].
    pub fn message(&self) -> Result<Message, DispatchError> {
        Message::from_bytes(&self.payload)
    }
}
