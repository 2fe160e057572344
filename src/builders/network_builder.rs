//! Build a linked edge network from [`NetworkConfig`].

use std::sync::Arc;

use crate::config::NetworkConfig;
use crate::core::{CloudServer, DevicePool, DispatchError, EdgeDevice, SimDevice, StationSet, Transport};
use crate::util::serde::Endpoint;

/// A fully wired network: cloud, stations and their devices.
#[derive(Debug)]
pub struct EdgeNetwork {
    /// Cloud server, network installed and registry attached.
    pub cloud: Arc<CloudServer>,
    /// Stations in configuration order, linked to the cloud.
    pub stations: StationSet,
    /// Every device across all stations.
    pub devices: Vec<Arc<SimDevice>>,
}

impl EdgeNetwork {
    /// Device with the given endpoint.
    #[must_use]
    pub fn device(&self, endpoint: Endpoint) -> Option<&Arc<SimDevice>> {
        self.devices.iter().find(|d| d.endpoint() == endpoint)
    }
}

/// Build and link a network over `transport`.
///
/// Setup aborts on the first error; a half-linked network is never returned.
///
/// # Errors
///
/// [`DispatchError::Config`] for invalid configuration, or any linking error.
pub fn build_network(
    cfg: &NetworkConfig,
    transport: Arc<dyn Transport>,
) -> Result<EdgeNetwork, DispatchError> {
    cfg.validate().map_err(DispatchError::Config)?;

    let cloud = Arc::new(CloudServer::new(Arc::clone(&transport)));
    cloud.install_network(cfg.cloud.into());

    let stations = StationSet::new(cfg.stations.len(), transport, |i| {
        cfg.stations[i].endpoint()
    });

    let mut devices = Vec::new();
    for (index, station_cfg) in cfg.stations.iter().enumerate() {
        let mut pool = DevicePool::new();
        for dev in &station_cfg.devices {
            let device = Arc::new(SimDevice::new(dev.endpoint(), dev.cpu, dev.memory, dev.price));
            pool.push(Arc::clone(&device) as Arc<dyn EdgeDevice>);
            devices.push(device);
        }
        stations.connect_devices(index, pool)?;
    }

    cloud.attach_registry(Arc::clone(stations.registry()));
    stations.link_cloud(&cloud)?;

    tracing::info!(
        stations = stations.len(),
        devices = devices.len(),
        cloud = %cfg.cloud.address,
        "edge network built"
    );

    Ok(EdgeNetwork {
        cloud,
        stations,
        devices,
    })
}
