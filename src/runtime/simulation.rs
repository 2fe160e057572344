//! Deterministic single-threaded simulation over [`InMemoryTransport`].
//!
//! Frames are delivered strictly in send order, one handler at a time, which
//! makes cascades reproducible in tests.

use std::sync::Arc;

use crate::builders::{build_network, EdgeNetwork};
use crate::config::NetworkConfig;
use crate::core::{DispatchError, EdgeDevice, Message, MessageKind, Packet, Task, Transport};
use crate::infra::InMemoryTransport;
use crate::util::serde::{Endpoint, TaskId};

/// Default bound on deliveries per [`Simulation::run`].
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Summary of one [`Simulation::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    /// Frames delivered.
    pub steps: usize,
    /// `(task, device)` pairs for tasks placed on devices during the run.
    pub device_placements: Vec<(TaskId, Endpoint)>,
    /// Tasks the cloud executed during the run.
    pub cloud_placements: Vec<TaskId>,
}

/// Event loop owning a network and its in-memory transport.
pub struct Simulation {
    network: EdgeNetwork,
    transport: Arc<InMemoryTransport>,
    max_steps: usize,
}

impl Simulation {
    /// Build a network from `cfg` over a fresh in-memory transport.
    ///
    /// # Errors
    ///
    /// See [`build_network`].
    pub fn from_config(cfg: &NetworkConfig) -> Result<Self, DispatchError> {
        let transport = Arc::new(InMemoryTransport::new());
        let network = build_network(cfg, Arc::clone(&transport) as Arc<dyn Transport>)?;
        Ok(Self::new(network, transport))
    }

    /// Drive an existing network. `transport` must be the one it was built on.
    #[must_use]
    pub fn new(network: EdgeNetwork, transport: Arc<InMemoryTransport>) -> Self {
        Self {
            network,
            transport,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Set the delivery bound for [`Simulation::run`].
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// The simulated network.
    #[must_use]
    pub const fn network(&self) -> &EdgeNetwork {
        &self.network
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &Arc<InMemoryTransport> {
        &self.transport
    }

    fn station_endpoint(&self, index: usize) -> Result<Endpoint, DispatchError> {
        Ok(self.network.stations.get(index)?.endpoint())
    }

    /// Have the cloud send a `DispatchRequest` for `task` to station `index`.
    ///
    /// # Errors
    ///
    /// Index or transport errors.
    pub fn dispatch(&self, task: Task, index: usize) -> Result<(), DispatchError> {
        let station = self.station_endpoint(index)?;
        self.network.cloud.dispatch(task, station)
    }

    /// Inject an `OffloadRequest` for `task` at station `index`, sent from the cloud.
    ///
    /// # Errors
    ///
    /// Index or transport errors.
    pub fn offload(&self, task: Task, index: usize) -> Result<(), DispatchError> {
        let station = self.station_endpoint(index)?;
        let from = self
            .network
            .cloud
            .endpoint()
            .ok_or(DispatchError::CloudNotInitialized)?;
        self.transport
            .send(from, station, &Message::new(MessageKind::OffloadRequest, task))
    }

    /// Deliver one frame. Returns `Ok(false)` when nothing was queued.
    ///
    /// # Errors
    ///
    /// Errors from the receiving handler, or [`DispatchError::UnknownEndpoint`].
    pub fn step(&mut self, report: &mut SimulationReport) -> Result<bool, DispatchError> {
        let Some(packet) = self.transport.pop() else {
            return Ok(false);
        };
        report.steps += 1;
        self.deliver(&packet, report)?;
        Ok(true)
    }

    fn deliver(&self, packet: &Packet, report: &mut SimulationReport) -> Result<(), DispatchError> {
        if let Some(station) = self.network.stations.find(packet.to) {
            return station.receive(&packet.payload, packet.from);
        }

        if self.network.cloud.endpoint() == Some(packet.to) {
            let msg = packet.message()?;
            if msg.kind() == MessageKind::HandleRequest {
                report.cloud_placements.push(msg.task().id().clone());
            }
            return self.network.cloud.receive(&packet.payload, packet.from);
        }

        if let Some(device) = self.network.device(packet.to) {
            let msg = packet.message()?;
            if msg.kind() != MessageKind::HandleRequest {
                tracing::warn!(device = %packet.to, kind = %msg.kind(), "device ignores message");
                return Ok(());
            }
            device.on_handle(msg.task());
            report
                .device_placements
                .push((msg.task().id().clone(), device.endpoint()));
            return Ok(());
        }

        tracing::warn!(to = %packet.to, from = %packet.from, "undeliverable packet");
        Err(DispatchError::UnknownEndpoint(packet.to))
    }

    /// Deliver frames until the transport is empty.
    ///
    /// # Errors
    ///
    /// The first delivery error, or [`DispatchError::StepLimitExceeded`] if the
    /// network is still busy after `max_steps` deliveries.
    pub fn run(&mut self) -> Result<SimulationReport, DispatchError> {
        let mut report = SimulationReport::default();
        while self.step(&mut report)? {
            if report.steps >= self.max_steps && !self.transport.is_empty() {
                return Err(DispatchError::StepLimitExceeded(self.max_steps));
            }
        }
        tracing::debug!(steps = report.steps, "simulation quiescent");
        Ok(report)
    }
}
