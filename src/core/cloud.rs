//! Minimal cloud server counterpart.
//!
//! The cloud originates dispatch requests, retires bookkeeping on success,
//! re-routes reported failures into the peer cascade and accepts every task
//! that reaches it as a last resort (it is treated as unbounded).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::core::{DispatchError, DispatchRegistry, Message, MessageKind, Task, Transport};
use crate::util::serde::{Endpoint, TaskId};

/// Counters describing what the cloud has observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloudStats {
    /// Dispatch requests originated.
    pub dispatched: u64,
    /// `DispatchSucceeded` notifications received.
    pub succeeded: u64,
    /// `DispatchFailed` notifications received.
    pub failed: u64,
    /// Tasks executed on the cloud itself.
    pub executed: u64,
}

#[derive(Default)]
struct CloudCounters {
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    executed: AtomicU64,
}

/// Cloud server endpoint.
pub struct CloudServer {
    endpoint: OnceLock<Endpoint>,
    transport: Arc<dyn Transport>,
    registry: OnceLock<Arc<DispatchRegistry>>,
    pending: Mutex<HashMap<TaskId, Endpoint>>,
    executed: Mutex<Vec<Task>>,
    counters: CloudCounters,
}

impl CloudServer {
    /// Create a cloud server without a network identity.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: OnceLock::new(),
            transport,
            registry: OnceLock::new(),
            pending: Mutex::new(HashMap::new()),
            executed: Mutex::new(Vec::new()),
            counters: CloudCounters::default(),
        }
    }

    /// Give the cloud its network identity. Returns false if it already had one.
    pub fn install_network(&self, endpoint: Endpoint) -> bool {
        self.endpoint.set(endpoint).is_ok()
    }

    /// Network identity, once installed.
    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.endpoint.get().copied()
    }

    /// Whether the network identity exists.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.endpoint.get().is_some()
    }

    /// Attach the stations' registry so success notifications can clear it.
    pub fn attach_registry(&self, registry: Arc<DispatchRegistry>) {
        if self.registry.set(registry).is_err() {
            tracing::warn!("cloud registry already attached; keeping the first one");
        }
    }

    fn own_endpoint(&self) -> Result<Endpoint, DispatchError> {
        self.endpoint().ok_or(DispatchError::CloudNotInitialized)
    }

    /// Originate a `DispatchRequest` for `task` at `station`.
    ///
    /// # Errors
    ///
    /// Fails if the cloud has no network identity or the transport rejects the send.
    pub fn dispatch(&self, task: Task, station: Endpoint) -> Result<(), DispatchError> {
        let from = self.own_endpoint()?;
        let id = task.id().clone();
        let msg = Message::new(MessageKind::DispatchRequest, task);
        // Registered before sending: a threaded station may answer first.
        self.pending.lock().insert(id.clone(), station);
        if let Err(e) = self.transport.send(from, station, &msg) {
            self.pending.lock().remove(&id);
            return Err(e);
        }
        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::info!(task = %id, %station, "cloud dispatched task");
        Ok(())
    }

    /// Handle an inbound frame.
    ///
    /// # Errors
    ///
    /// Fails on malformed frames, on kinds the cloud does not accept, or when
    /// a re-route cannot be sent.
    pub fn receive(&self, payload: &[u8], from: Endpoint) -> Result<(), DispatchError> {
        let msg = Message::from_bytes(payload)?;
        match msg.kind() {
            MessageKind::DispatchSucceeded => {
                self.on_dispatch_succeeded(msg.task().id(), from);
                Ok(())
            }
            MessageKind::DispatchFailed => self.on_dispatch_failed(msg, from),
            MessageKind::HandleRequest => {
                self.on_handle(msg.into_task(), from);
                Ok(())
            }
            kind => Err(DispatchError::NoHandler(kind)),
        }
    }

    fn on_dispatch_succeeded(&self, task_id: &TaskId, from: Endpoint) {
        self.pending.lock().remove(task_id);
        if let Some(registry) = self.registry.get() {
            registry.clear(task_id);
        }
        self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::info!(task = %task_id, station = %from, "cloud retired dispatched task");
    }

    fn on_dispatch_failed(&self, mut msg: Message, from: Endpoint) -> Result<(), DispatchError> {
        self.pending.lock().remove(msg.task().id());
        self.counters.failed.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            task = %msg.task().id(),
            station = %from,
            "station lacks resources, re-routing as offload request"
        );
        msg.set_kind(MessageKind::OffloadRequest);
        self.transport.send(self.own_endpoint()?, from, &msg)
    }

    fn on_handle(&self, task: Task, from: Endpoint) {
        self.pending.lock().remove(task.id());
        self.counters.executed.fetch_add(1, Ordering::Relaxed);
        tracing::info!(task = %task.id(), station = %from, "cloud executing task");
        self.executed.lock().push(task);
    }

    /// Dispatched tasks still awaiting a verdict from their station.
    ///
    /// A task leaves this map on `DispatchSucceeded`, on `DispatchFailed` (the
    /// peer cascade owns it from then on) or when it reaches the cloud.
    #[must_use]
    pub fn pending(&self) -> HashMap<TaskId, Endpoint> {
        self.pending.lock().clone()
    }

    /// Tasks executed on the cloud, in arrival order.
    #[must_use]
    pub fn executed(&self) -> Vec<Task> {
        self.executed.lock().clone()
    }

    /// Snapshot of counters.
    #[must_use]
    pub fn stats(&self) -> CloudStats {
        CloudStats {
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            executed: self.counters.executed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CloudServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudServer")
            .field("endpoint", &self.endpoint())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
