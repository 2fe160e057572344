//! Builders that wire stations, devices and the cloud from configuration.

pub mod network_builder;

pub use network_builder::{build_network, EdgeNetwork};
