//! In-memory FIFO transport for deterministic simulation.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::{DispatchError, Message, Packet, Transport};
use crate::util::serde::Endpoint;

/// Queues frames in send order; a driver pops and delivers them.
///
/// Every sent packet is also appended to a history log for inspection.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    in_flight: Mutex<VecDeque<Packet>>,
    history: Mutex<Vec<Packet>>,
}

impl InMemoryTransport {
    /// Create an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next packet to deliver, FIFO.
    pub fn pop(&self) -> Option<Packet> {
        self.in_flight.lock().pop_front()
    }

    /// Remove and return every queued packet.
    pub fn drain(&self) -> Vec<Packet> {
        self.in_flight.lock().drain(..).collect()
    }

    /// Number of packets waiting for delivery.
    #[must_use]
    pub fn len(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// True when nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_flight.lock().is_empty()
    }

    /// Every packet ever sent, in send order.
    #[must_use]
    pub fn history(&self) -> Vec<Packet> {
        self.history.lock().clone()
    }
}

impl Transport for InMemoryTransport {
    fn send(&self, from: Endpoint, to: Endpoint, message: &Message) -> Result<(), DispatchError> {
        let packet = Packet::encode(from, to, message)?;
        tracing::trace!(%from, %to, kind = %message.kind(), "queued packet");
        self.history.lock().push(packet.clone());
        self.in_flight.lock().push_back(packet);
        Ok(())
    }
}
