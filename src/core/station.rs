//! Base station: admission check and the two escalation cascades.
//!
//! A station receives framed messages from the transport and dispatches them
//! through a per-kind handler table:
//!
//! - `DispatchRequest` (primary cascade): place locally, otherwise report
//!   `DispatchFailed` to the cloud. Siblings are never tried on this path.
//! - `OffloadRequest` (peer cascade): place locally, otherwise record the
//!   failure and hand the envelope to the first sibling that has not failed
//!   the task yet, falling back to the cloud once every station has failed.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::core::station_set::StationServices;
use crate::core::{
    build_audit_event, AuditSink, CloudServer, DevicePool, DispatchError, EdgeDevice, Message,
    MessageKind, Task, Transport,
};
use crate::util::serde::{Endpoint, TaskId};

/// Handler invoked for one message kind. Runs to completion before returning.
pub type RequestHandler =
    Arc<dyn Fn(&BaseStation, Message, Endpoint) -> Result<(), DispatchError> + Send + Sync>;

/// Where a station sends a task it could not place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// First sibling, in set order, not yet recorded as failed.
    Sibling(Endpoint),
    /// Every station has failed; the cloud takes the task.
    Cloud(Endpoint),
}

/// Dispatch node attached to a device pool, its siblings and one cloud.
pub struct BaseStation {
    endpoint: Endpoint,
    devices: RwLock<DevicePool>,
    services: Arc<StationServices>,
    cloud: OnceLock<Endpoint>,
    transport: Arc<dyn Transport>,
    handlers: RwLock<HashMap<MessageKind, RequestHandler>>,
    audit: RwLock<Option<Arc<dyn AuditSink>>>,
}

impl BaseStation {
    pub(crate) fn new(
        endpoint: Endpoint,
        services: Arc<StationServices>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let mut handlers: HashMap<MessageKind, RequestHandler> = HashMap::new();
        handlers.insert(
            MessageKind::DispatchRequest,
            Arc::new(Self::on_dispatch_request),
        );
        handlers.insert(MessageKind::OffloadRequest, Arc::new(Self::on_offload_request));

        Self {
            endpoint,
            devices: RwLock::new(DevicePool::new()),
            services,
            cloud: OnceLock::new(),
            transport,
            handlers: RwLock::new(handlers),
            audit: RwLock::new(None),
        }
    }

    /// Network identity of this station.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Station address, the key used in the dispatch registry.
    #[must_use]
    pub const fn address(&self) -> Ipv4Addr {
        self.endpoint.address
    }

    /// Station port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.endpoint.port
    }

    /// Attach the device pool this station dispatches into.
    pub fn connect_devices(&self, devices: DevicePool) {
        *self.devices.write() = devices;
    }

    /// Snapshot of the attached device pool.
    #[must_use]
    pub fn devices(&self) -> DevicePool {
        self.devices.read().clone()
    }

    /// Link this station to `cloud`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::CloudNotInitialized`] if the cloud has no network
    /// identity yet; [`DispatchError::CloudAlreadyLinked`] on a second link.
    pub fn link_cloud(&self, cloud: &CloudServer) -> Result<(), DispatchError> {
        let Some(cloud_endpoint) = cloud.endpoint() else {
            tracing::error!(station = %self.endpoint, "link_cloud: cloud network is not initialized");
            return Err(DispatchError::CloudNotInitialized);
        };
        self.cloud
            .set(cloud_endpoint)
            .map_err(|_| DispatchError::CloudAlreadyLinked(self.endpoint))?;
        tracing::debug!(station = %self.endpoint, cloud = %cloud_endpoint, "linked cloud");
        Ok(())
    }

    /// Linked cloud endpoint.
    #[must_use]
    pub fn cloud_endpoint(&self) -> Option<Endpoint> {
        self.cloud.get().copied()
    }

    fn cloud(&self) -> Result<Endpoint, DispatchError> {
        self.cloud_endpoint()
            .ok_or(DispatchError::CloudNotLinked(self.endpoint))
    }

    /// Route audit events to `sink`.
    pub fn set_audit_sink(&self, sink: Arc<dyn AuditSink>) {
        *self.audit.write() = Some(sink);
    }

    /// Replace the handler for `kind`.
    pub fn set_request_handler<F>(&self, kind: MessageKind, handler: F)
    where
        F: Fn(&Self, Message, Endpoint) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.install_handler(kind, Arc::new(handler));
    }

    pub(crate) fn install_handler(&self, kind: MessageKind, handler: RequestHandler) {
        self.handlers.write().insert(kind, handler);
    }

    /// Whether some device in the pool admits `task`. Reserves nothing.
    #[must_use]
    pub fn try_local_admit(&self, task: &Task) -> bool {
        self.devices.read().first_fit(task).is_some()
    }

    /// First device, in pool order, that admits `task`.
    #[must_use]
    pub fn select_device(&self, task: &Task) -> Option<Arc<dyn EdgeDevice>> {
        self.devices.read().first_fit(task).cloned()
    }

    /// Decode a frame and run the handler registered for its kind.
    ///
    /// # Errors
    ///
    /// Decoding errors, [`DispatchError::NoHandler`] for unregistered kinds,
    /// and whatever the handler returns.
    pub fn receive(&self, payload: &[u8], from: Endpoint) -> Result<(), DispatchError> {
        let msg = Message::from_bytes(payload)?;
        let handler = self
            .handlers
            .read()
            .get(&msg.kind())
            .cloned()
            .ok_or(DispatchError::NoHandler(msg.kind()))?;
        handler(self, msg, from)
    }

    /// Send `msg` to `to` from this station.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub fn write(&self, msg: &Message, to: Endpoint) -> Result<(), DispatchError> {
        self.transport.send(self.endpoint, to, msg)
    }

    /// Record that this station failed `task_id`.
    pub fn record_failure(&self, task_id: &TaskId) {
        self.services.record_failure(task_id, self.address());
    }

    /// Whether `station` already failed `task_id`.
    #[must_use]
    pub fn has_failed(&self, task_id: &TaskId, station: Ipv4Addr) -> bool {
        self.services.has_failed(task_id, station)
    }

    /// Drop all failure records for `task_id`.
    pub fn clear_records(&self, task_id: &TaskId) {
        self.services.clear(task_id);
    }

    /// Pick the next hop for a task this station could not place.
    ///
    /// # Errors
    ///
    /// [`DispatchError::CloudNotLinked`] when the cascade is exhausted and no
    /// cloud is linked.
    pub fn escalation_target(&self, task_id: &TaskId) -> Result<Escalation, DispatchError> {
        match self
            .services
            .stations()
            .iter()
            .find(|s| !self.services.has_failed(task_id, s.address))
        {
            Some(sibling) => Ok(Escalation::Sibling(*sibling)),
            None => self.cloud().map(Escalation::Cloud),
        }
    }

    /// Primary cascade: local device or report failure to the cloud.
    ///
    /// # Errors
    ///
    /// [`DispatchError::CloudNotLinked`] or transport failures.
    pub fn on_dispatch_request(&self, mut msg: Message, from: Endpoint) -> Result<(), DispatchError> {
        let cloud = self.cloud()?;
        tracing::info!(station = %self.endpoint, %from, task = %msg.task().id(), "dispatch request received");

        if let Some(device) = self.select_device(msg.task()) {
            let target = device.endpoint();
            msg.set_kind(MessageKind::HandleRequest);
            self.write(&msg, target)?;
            self.audit(msg.task(), "handle", target);
            tracing::info!(station = %self.endpoint, device = %target, task = %msg.task().id(), "dispatching to device");

            msg.set_kind(MessageKind::DispatchSucceeded);
            return self.write(&msg, cloud);
        }

        msg.set_kind(MessageKind::DispatchFailed);
        self.write(&msg, cloud)?;
        self.audit(msg.task(), "dispatch_failed", cloud);
        tracing::info!(station = %self.endpoint, %cloud, task = %msg.task().id(), "lacking resources, reporting to cloud");
        Ok(())
    }

    /// Peer cascade: local device, else first unvisited sibling, else cloud.
    ///
    /// # Errors
    ///
    /// [`DispatchError::CloudNotLinked`] when the cloud is needed but not
    /// linked, or transport failures. An aborted cascade leaves no registry
    /// entry behind for the task.
    pub fn on_offload_request(&self, msg: Message, from: Endpoint) -> Result<(), DispatchError> {
        tracing::info!(station = %self.endpoint, %from, task = %msg.task().id(), "offload request received");

        let task_id = msg.task().id().clone();
        self.offload_cascade(msg).inspect_err(|e| {
            self.clear_records(&task_id);
            tracing::warn!(station = %self.endpoint, task = %task_id, "offload cascade aborted: {e}");
        })
    }

    fn offload_cascade(&self, mut msg: Message) -> Result<(), DispatchError> {
        if let Some(device) = self.select_device(msg.task()) {
            let target = device.endpoint();
            msg.set_kind(MessageKind::HandleRequest);
            self.write(&msg, target)?;
            self.clear_records(msg.task().id());
            self.audit(msg.task(), "handle", target);
            tracing::info!(station = %self.endpoint, device = %target, task = %msg.task().id(), "dispatching to device");
            return Ok(());
        }

        self.record_failure(msg.task().id());

        match self.escalation_target(msg.task().id())? {
            Escalation::Sibling(sibling) => {
                self.write(&msg, sibling)?;
                self.audit(msg.task(), "forward_sibling", sibling);
                tracing::info!(station = %self.endpoint, %sibling, task = %msg.task().id(), "lacking resources, forwarding to sibling");
            }
            Escalation::Cloud(cloud) => {
                msg.set_kind(MessageKind::HandleRequest);
                self.write(&msg, cloud)?;
                self.clear_records(msg.task().id());
                self.audit(msg.task(), "fallback_cloud", cloud);
                tracing::info!(station = %self.endpoint, %cloud, task = %msg.task().id(), "all stations exhausted, handing to cloud");
            }
        }
        Ok(())
    }

    fn audit(&self, task: &Task, action: &str, target: Endpoint) {
        if let Some(sink) = self.audit.read().as_ref() {
            sink.record(build_audit_event(
                task.id().as_str(),
                self.endpoint.to_string(),
                action,
                target.to_string(),
            ));
        }
    }
}

impl std::fmt::Debug for BaseStation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseStation")
            .field("endpoint", &self.endpoint)
            .field("cloud", &self.cloud_endpoint())
            .field("devices", &*self.devices.read())
            .finish_non_exhaustive()
    }
}
