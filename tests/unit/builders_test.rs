//! Tests for builder modules

use std::net::Ipv4Addr;
use std::sync::Arc;

use edge_dispatch::builders::build_network;
use edge_dispatch::config::{DeviceConfig, EndpointConfig, NetworkConfig, StationConfig};
use edge_dispatch::core::{DispatchError, EdgeDevice, Transport};
use edge_dispatch::infra::InMemoryTransport;
use edge_dispatch::util::Endpoint;

fn config() -> NetworkConfig {
    NetworkConfig {
        cloud: EndpointConfig {
            address: Ipv4Addr::new(10, 0, 0, 1),
            port: 8860,
        },
        stations: vec![
            StationConfig {
                address: Ipv4Addr::new(10, 1, 0, 1),
                port: 8860,
                devices: vec![
                    DeviceConfig {
                        address: Ipv4Addr::new(10, 2, 0, 1),
                        port: 8860,
                        cpu: 3.0,
                        memory: 2.0,
                        price: 4.0,
                    },
                    DeviceConfig {
                        address: Ipv4Addr::new(10, 2, 0, 2),
                        port: 8860,
                        cpu: 8.0,
                        memory: 8.0,
                        price: 1.0,
                    },
                ],
            },
            StationConfig {
                address: Ipv4Addr::new(10, 1, 0, 2),
                port: 8860,
                devices: vec![],
            },
        ],
    }
}

#[test]
fn test_build_network_wires_everything() {
    let transport: Arc<dyn Transport> = Arc::new(InMemoryTransport::new());
    let net = build_network(&config(), transport).unwrap();

    let cloud = Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 8860);
    assert_eq!(net.cloud.endpoint(), Some(cloud));
    assert_eq!(net.stations.len(), 2);
    assert_eq!(net.devices.len(), 2);

    for bs in &net.stations {
        assert_eq!(bs.cloud_endpoint(), Some(cloud));
    }

    let pool = net.stations[0].devices();
    let order: Vec<_> = pool.iter().map(|d| d.endpoint().address).collect();
    assert_eq!(order, vec![Ipv4Addr::new(10, 2, 0, 1), Ipv4Addr::new(10, 2, 0, 2)]);
    assert!(net.stations[1].devices().is_empty());
}

#[test]
fn test_build_network_finds_devices() {
    let transport: Arc<dyn Transport> = Arc::new(InMemoryTransport::new());
    let net = build_network(&config(), transport).unwrap();
    let ep = Endpoint::new(Ipv4Addr::new(10, 2, 0, 2), 8860);
    assert!((net.device(ep).unwrap().price() - 1.0).abs() < f64::EPSILON);
    assert!(net.device(Endpoint::new(Ipv4Addr::new(10, 9, 9, 9), 1)).is_none());
}

#[test]
fn test_build_network_rejects_invalid_config() {
    let mut cfg = config();
    cfg.stations.clear();
    let transport: Arc<dyn Transport> = Arc::new(InMemoryTransport::new());
    let err = build_network(&cfg, transport).unwrap_err();
    assert!(matches!(err, DispatchError::Config(_)));
}

#[test]
fn test_build_network_rejects_shared_device_endpoint() {
    let mut cfg = config();
    let shared = cfg.stations[0].devices[0].clone();
    cfg.stations[1].devices.push(shared);
    let transport: Arc<dyn Transport> = Arc::new(InMemoryTransport::new());
    let err = build_network(&cfg, transport).unwrap_err();
    assert!(matches!(err, DispatchError::Config(ref msg) if msg.contains("10.2.0.1:8860")));
}
