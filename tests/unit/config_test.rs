//! Tests for configuration validation

use std::net::Ipv4Addr;

use edge_dispatch::config::{DeviceConfig, EndpointConfig, NetworkConfig, StationConfig};

fn device(cpu: f64, memory: f64, price: f64) -> DeviceConfig {
    DeviceConfig {
        address: Ipv4Addr::new(10, 2, 0, 1),
        port: 8860,
        cpu,
        memory,
        price,
    }
}

fn network(stations: Vec<StationConfig>) -> NetworkConfig {
    NetworkConfig {
        cloud: EndpointConfig {
            address: Ipv4Addr::new(10, 0, 0, 1),
            port: 8860,
        },
        stations,
    }
}

fn station(last: u8, devices: Vec<DeviceConfig>) -> StationConfig {
    StationConfig {
        address: Ipv4Addr::new(10, 1, 0, last),
        port: 8860,
        devices,
    }
}

#[test]
fn test_network_config_validation() {
    let cfg = network(vec![station(1, vec![device(3.0, 2.0, 4.0)]), station(2, vec![])]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_network_config_empty_stations() {
    assert!(network(vec![]).validate().is_err());
}

#[test]
fn test_network_config_duplicate_station_address() {
    let cfg = network(vec![station(1, vec![]), station(1, vec![])]);
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("duplicate station address 10.1.0.1"));
}

#[test]
fn test_network_config_station_on_cloud_address() {
    let mut cfg = network(vec![station(1, vec![])]);
    cfg.stations[0].address = Ipv4Addr::new(10, 0, 0, 1);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_device_config_invalid_values() {
    assert!(device(0.0, 1.0, 1.0).validate().is_err());
    assert!(device(1.0, 0.0, 1.0).validate().is_err());
    assert!(device(1.0, 1.0, -1.0).validate().is_err());
    assert!(device(1.0, 1.0, 0.0).validate().is_ok());
}

#[test]
fn test_network_config_reports_bad_device() {
    let cfg = network(vec![station(1, vec![device(0.0, 1.0, 1.0)])]);
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("station 10.1.0.1"));
}

#[test]
fn test_network_config_from_json() {
    let json = r#"{
        "cloud": { "address": "10.0.0.1" },
        "stations": [
            {
                "address": "10.1.0.1",
                "port": 9000,
                "devices": [
                    { "address": "10.2.0.1", "cpu": 3.0, "memory": 2.0, "price": 4.0 }
                ]
            },
            { "address": "10.1.0.2" }
        ]
    }"#;

    let cfg = NetworkConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.cloud.port, 8860);
    assert_eq!(cfg.stations[0].port, 9000);
    assert_eq!(cfg.stations[0].devices[0].port, 8860);
    assert!(cfg.stations[1].devices.is_empty());
}

#[test]
fn test_network_config_from_bad_json() {
    let err = NetworkConfig::from_json_str("{ \"stations\": [] }").unwrap_err();
    assert!(err.starts_with("parse error"));
}

fn device_at(address: Ipv4Addr, port: u16) -> DeviceConfig {
    DeviceConfig {
        address,
        port,
        ..device(3.0, 2.0, 1.0)
    }
}

#[test]
fn test_network_config_duplicate_device_across_stations() {
    let shared = Ipv4Addr::new(10, 2, 0, 1);
    let cfg = network(vec![
        station(1, vec![device_at(shared, 8860)]),
        station(2, vec![device_at(shared, 8860)]),
    ]);
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("10.2.0.1:8860"));
    assert!(err.contains("another device"));
}

#[test]
fn test_network_config_duplicate_device_within_station() {
    let addr = Ipv4Addr::new(10, 2, 0, 1);
    let cfg = network(vec![station(1, vec![device_at(addr, 8860), device_at(addr, 8860)])]);
    assert!(cfg.validate().unwrap_err().contains("another device"));
}

#[test]
fn test_network_config_device_on_station_endpoint() {
    let cfg = network(vec![
        station(1, vec![]),
        station(2, vec![device_at(Ipv4Addr::new(10, 1, 0, 1), 8860)]),
    ]);
    assert!(cfg.validate().unwrap_err().contains("a station"));
}

#[test]
fn test_network_config_device_on_cloud_endpoint() {
    let cfg = network(vec![station(1, vec![device_at(Ipv4Addr::new(10, 0, 0, 1), 8860)])]);
    assert!(cfg.validate().unwrap_err().contains("the cloud"));
}

#[test]
fn test_network_config_device_port_disambiguates() {
    let addr = Ipv4Addr::new(10, 2, 0, 1);
    let cfg = network(vec![station(1, vec![device_at(addr, 8860), device_at(addr, 8861)])]);
    assert!(cfg.validate().is_ok());
}
