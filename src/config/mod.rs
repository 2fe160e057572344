//! Configuration models for stations, devices and the cloud.

pub mod network;

pub use network::{DeviceConfig, EndpointConfig, NetworkConfig, StationConfig, CONFIG_ENV_VAR};
