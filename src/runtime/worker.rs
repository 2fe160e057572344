//! Threaded runtime: every node runs on its own OS thread.
//!
//! Stations handle their inbox sequentially but run concurrently with each
//! other; the only state they share is the dispatch registry.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::builders::{build_network, EdgeNetwork};
use crate::config::NetworkConfig;
use crate::core::{
    BaseStation, CloudServer, DispatchError, EdgeDevice, Message, MessageKind, Packet, SimDevice,
    Task, Transport,
};
use crate::infra::ChannelTransport;
use crate::util::serde::Endpoint;

/// A node a worker thread drives.
#[derive(Clone)]
pub enum NodeHandle {
    /// Base station.
    Station(Arc<BaseStation>),
    /// Cloud server.
    Cloud(Arc<CloudServer>),
    /// Edge device; only `HandleRequest` frames are meaningful to it.
    Device(Arc<SimDevice>),
}

impl NodeHandle {
    fn label(&self) -> String {
        match self {
            Self::Station(bs) => format!("station-{}", bs.endpoint()),
            Self::Cloud(cs) => cs
                .endpoint()
                .map_or_else(|| "cloud".to_string(), |ep| format!("cloud-{ep}")),
            Self::Device(dev) => format!("device-{}", dev.endpoint()),
        }
    }

    fn handle(&self, packet: &Packet) -> Result<(), DispatchError> {
        match self {
            Self::Station(bs) => bs.receive(&packet.payload, packet.from),
            Self::Cloud(cs) => cs.receive(&packet.payload, packet.from),
            Self::Device(dev) => {
                let msg = packet.message()?;
                if msg.kind() == MessageKind::HandleRequest {
                    dev.on_handle(msg.task());
                } else {
                    tracing::warn!(device = %dev.endpoint(), kind = %msg.kind(), "device ignores message");
                }
                Ok(())
            }
        }
    }
}

/// Spawn a thread that handles `inbox` until it disconnects.
///
/// Every frame is acknowledged with [`ChannelTransport::mark_handled`], even
/// when its handler fails; failures are logged.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_node_worker(
    node: NodeHandle,
    inbox: Receiver<Packet>,
    transport: Arc<ChannelTransport>,
) -> std::io::Result<JoinHandle<()>> {
    let name = node.label();
    thread::Builder::new().name(name.clone()).spawn(move || {
        for packet in &inbox {
            if let Err(e) = node.handle(&packet) {
                tracing::error!(node = %name, from = %packet.from, "handler failed: {e}");
            }
            transport.mark_handled();
        }
        tracing::debug!(node = %name, "worker exiting");
    })
}

/// A network whose nodes each run on a dedicated thread.
pub struct ThreadedNetwork {
    network: EdgeNetwork,
    transport: Arc<ChannelTransport>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadedNetwork {
    /// Build the network from `cfg` and start one worker per node.
    ///
    /// # Errors
    ///
    /// Build errors, or [`DispatchError::Transport`] if a thread cannot be spawned.
    pub fn start(cfg: &NetworkConfig) -> Result<Self, DispatchError> {
        let transport = Arc::new(ChannelTransport::new());
        let network = build_network(cfg, Arc::clone(&transport) as Arc<dyn Transport>)?;

        let cloud_endpoint = network
            .cloud
            .endpoint()
            .ok_or(DispatchError::CloudNotInitialized)?;

        let mut nodes: Vec<(Endpoint, NodeHandle)> = Vec::new();
        nodes.push((cloud_endpoint, NodeHandle::Cloud(Arc::clone(&network.cloud))));
        for bs in &network.stations {
            nodes.push((bs.endpoint(), NodeHandle::Station(Arc::clone(bs))));
        }
        for dev in &network.devices {
            nodes.push((dev.endpoint(), NodeHandle::Device(Arc::clone(dev))));
        }

        let mut this = Self {
            network,
            transport,
            workers: Vec::with_capacity(nodes.len()),
        };
        for (endpoint, node) in nodes {
            let inbox = this.transport.register(endpoint);
            let handle = spawn_node_worker(node, inbox, Arc::clone(&this.transport))
                .map_err(|e| DispatchError::Transport(format!("spawning worker for {endpoint}: {e}")))?;
            this.workers.push(handle);
        }

        tracing::info!(workers = this.workers.len(), "threaded network started");
        Ok(this)
    }

    /// The running network.
    #[must_use]
    pub const fn network(&self) -> &EdgeNetwork {
        &self.network
    }

    /// The channel transport.
    #[must_use]
    pub const fn transport(&self) -> &Arc<ChannelTransport> {
        &self.transport
    }

    /// Have the cloud send a `DispatchRequest` for `task` to station `index`.
    ///
    /// # Errors
    ///
    /// Index or transport errors.
    pub fn dispatch(&self, task: Task, index: usize) -> Result<(), DispatchError> {
        let station = self.network.stations.get(index)?.endpoint();
        self.network.cloud.dispatch(task, station)
    }

    /// Inject an `OffloadRequest` for `task` at station `index`, sent from the cloud.
    ///
    /// # Errors
    ///
    /// Index or transport errors.
    pub fn offload(&self, task: Task, index: usize) -> Result<(), DispatchError> {
        let station = self.network.stations.get(index)?.endpoint();
        let from = self
            .network
            .cloud
            .endpoint()
            .ok_or(DispatchError::CloudNotInitialized)?;
        self.transport
            .send(from, station, &Message::new(MessageKind::OffloadRequest, task))
    }

    /// Block until every frame has been handled or `timeout` elapses.
    #[must_use]
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.transport.wait_idle(timeout)
    }

    /// Close every inbox and join the workers.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.transport.close();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

impl Drop for ThreadedNetwork {
    fn drop(&mut self) {
        self.stop();
    }
}
