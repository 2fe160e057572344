//! Channel-backed transport: one crossbeam inbox per endpoint.
//!
//! Frames sent but not yet handled are counted so a driver can block until
//! the network is idle, see [`ChannelTransport::wait_idle`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::core::{DispatchError, Message, Packet, Transport};
use crate::util::serde::Endpoint;

/// Routes frames to per-endpoint inboxes. Endpoints must register first.
#[derive(Debug, Default)]
pub struct ChannelTransport {
    routes: RwLock<HashMap<Endpoint, Sender<Packet>>>,
    in_flight: Mutex<usize>,
    idle: Condvar,
}

impl ChannelTransport {
    /// Create a transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `endpoint` and return its inbox. Re-registering replaces the
    /// previous inbox.
    pub fn register(&self, endpoint: Endpoint) -> Receiver<Packet> {
        let (tx, rx) = unbounded();
        self.routes.write().insert(endpoint, tx);
        rx
    }

    /// Called by a receiver once it has finished handling a frame.
    pub fn mark_handled(&self) {
        let mut in_flight = self.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.idle.notify_all();
        }
    }

    /// Frames sent but not yet handled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.in_flight.lock()
    }

    /// Block until every sent frame has been handled or `timeout` elapses.
    /// Returns true when idle. A timeout too large to represent as a deadline
    /// waits without one.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut in_flight = self.in_flight.lock();
        while *in_flight > 0 {
            match deadline {
                Some(deadline) => {
                    if self.idle.wait_until(&mut in_flight, deadline).timed_out() {
                        return *in_flight == 0;
                    }
                }
                None => self.idle.wait(&mut in_flight),
            }
        }
        true
    }

    /// Drop every route. Inboxes disconnect once drained, which stops workers.
    pub fn close(&self) {
        self.routes.write().clear();
    }
}

impl Transport for ChannelTransport {
    fn send(&self, from: Endpoint, to: Endpoint, message: &Message) -> Result<(), DispatchError> {
        let packet = Packet::encode(from, to, message)?;
        let routes = self.routes.read();
        let tx = routes.get(&to).ok_or(DispatchError::UnknownEndpoint(to))?;
        // Count before sending so the receiver can never decrement first.
        *self.in_flight.lock() += 1;
        tx.send(packet).map_err(|_| {
            self.mark_handled();
            DispatchError::Transport(format!("inbox for {to} is closed"))
        })
    }
}
