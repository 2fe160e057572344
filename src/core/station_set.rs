//! The set of all base stations and the services they share.

use std::net::Ipv4Addr;
use std::ops::Index;
use std::sync::Arc;

use crate::core::station::RequestHandler;
use crate::core::{
    AuditSink, BaseStation, CloudServer, DevicePool, DispatchError, DispatchRegistry, Message,
    MessageKind, Transport,
};
use crate::util::serde::{Endpoint, TaskId};

/// Services every member station reaches through its shared handle:
/// the dispatch registry and the sibling directory in set order.
#[derive(Debug)]
pub struct StationServices {
    registry: Arc<DispatchRegistry>,
    directory: Vec<Endpoint>,
}

impl StationServices {
    /// Shared registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<DispatchRegistry> {
        &self.registry
    }

    /// Member endpoints in set order.
    #[must_use]
    pub fn stations(&self) -> &[Endpoint] {
        &self.directory
    }

    /// See [`DispatchRegistry::record_failure`].
    pub fn record_failure(&self, task_id: &TaskId, station: Ipv4Addr) {
        self.registry.record_failure(task_id, station);
    }

    /// See [`DispatchRegistry::has_failed`].
    #[must_use]
    pub fn has_failed(&self, task_id: &TaskId, station: Ipv4Addr) -> bool {
        self.registry.has_failed(task_id, station)
    }

    /// See [`DispatchRegistry::clear`].
    pub fn clear(&self, task_id: &TaskId) {
        self.registry.clear(task_id);
    }
}

/// Owns the stations and their shared services.
pub struct StationSet {
    stations: Vec<Arc<BaseStation>>,
    services: Arc<StationServices>,
}

impl StationSet {
    /// Eagerly build `count` stations; `endpoint_of(i)` names station `i`.
    ///
    /// Every station receives the shared services handle at construction.
    pub fn new<F>(count: usize, transport: Arc<dyn Transport>, endpoint_of: F) -> Self
    where
        F: FnMut(usize) -> Endpoint,
    {
        let directory: Vec<Endpoint> = (0..count).map(endpoint_of).collect();
        let services = Arc::new(StationServices {
            registry: Arc::new(DispatchRegistry::new()),
            directory,
        });

        let stations = services
            .directory
            .iter()
            .map(|&ep| {
                Arc::new(BaseStation::new(
                    ep,
                    Arc::clone(&services),
                    Arc::clone(&transport),
                ))
            })
            .collect();

        tracing::debug!(count, "station set built");
        Self { stations, services }
    }

    /// Link every station to `cloud`. Aborts on the first failure.
    ///
    /// # Errors
    ///
    /// See [`BaseStation::link_cloud`].
    pub fn link_cloud(&self, cloud: &CloudServer) -> Result<(), DispatchError> {
        self.stations.iter().try_for_each(|bs| bs.link_cloud(cloud))
    }

    /// Bounds-checked access.
    ///
    /// # Errors
    ///
    /// [`DispatchError::IndexOutOfRange`] when `index >= len()`.
    pub fn get(&self, index: usize) -> Result<&Arc<BaseStation>, DispatchError> {
        self.stations.get(index).ok_or(DispatchError::IndexOutOfRange {
            index,
            len: self.stations.len(),
        })
    }

    /// Attach `devices` to station `index`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::IndexOutOfRange`] when `index >= len()`.
    pub fn connect_devices(&self, index: usize, devices: DevicePool) -> Result<(), DispatchError> {
        self.get(index)?.connect_devices(devices);
        Ok(())
    }

    /// Station with the given endpoint.
    #[must_use]
    pub fn find(&self, endpoint: Endpoint) -> Option<&Arc<BaseStation>> {
        self.stations.iter().find(|bs| bs.endpoint() == endpoint)
    }

    /// Iterate stations in set order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<BaseStation>> {
        self.stations.iter()
    }

    /// Number of stations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// True when the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<DispatchRegistry> {
        self.services.registry()
    }

    /// See [`DispatchRegistry::record_failure`].
    pub fn record_failure(&self, task_id: &TaskId, station: Ipv4Addr) {
        self.services.record_failure(task_id, station);
    }

    /// See [`DispatchRegistry::has_failed`].
    #[must_use]
    pub fn has_failed(&self, task_id: &TaskId, station: Ipv4Addr) -> bool {
        self.services.has_failed(task_id, station)
    }

    /// See [`DispatchRegistry::clear`].
    pub fn clear(&self, task_id: &TaskId) {
        self.services.clear(task_id);
    }

    /// Install the same handler for `kind` on every station.
    pub fn set_request_handler<F>(&self, kind: MessageKind, handler: F)
    where
        F: Fn(&BaseStation, Message, Endpoint) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        let handler: RequestHandler = Arc::new(handler);
        for bs in &self.stations {
            bs.install_handler(kind, Arc::clone(&handler));
        }
    }

    /// Route every station's audit events to `sink`.
    pub fn set_audit_sink(&self, sink: &Arc<dyn AuditSink>) {
        for bs in &self.stations {
            bs.set_audit_sink(Arc::clone(sink));
        }
    }
}

impl Index<usize> for StationSet {
    type Output = Arc<BaseStation>;

    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Ok(bs) => bs,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<'a> IntoIterator for &'a StationSet {
    type Item = &'a Arc<BaseStation>;
    type IntoIter = std::slice::Iter<'a, Arc<BaseStation>>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}

impl std::fmt::Debug for StationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationSet")
            .field("stations", &self.services.directory)
            .field("open_records", &self.services.registry.len())
            .finish()
    }
}
