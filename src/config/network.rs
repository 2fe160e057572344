//! Network configuration structures.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;
use crate::util::serde::Endpoint;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "EDGE_DISPATCH_CONFIG";

fn default_port() -> u16 {
    8860
}

/// Address and port of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// IPv4 address.
    pub address: Ipv4Addr,
    /// Application port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl From<EndpointConfig> for Endpoint {
    fn from(cfg: EndpointConfig) -> Self {
        Self::new(cfg.address, cfg.port)
    }
}

/// Device attached to a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// IPv4 address.
    pub address: Ipv4Addr,
    /// Application port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Free CPU cycles.
    pub cpu: f64,
    /// Free memory.
    pub memory: f64,
    /// Price per task.
    pub price: f64,
}

impl DeviceConfig {
    /// Device endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.address, self.port)
    }

    /// Validate device values.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.cpu > 0.0) {
            return Err("cpu must be greater than 0".into());
        }
        if !(self.memory > 0.0) {
            return Err("memory must be greater than 0".into());
        }
        if !(self.price >= 0.0) {
            return Err("price must not be negative".into());
        }
        Ok(())
    }
}

/// Station configuration. Device order is the first-fit order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    /// IPv4 address.
    pub address: Ipv4Addr,
    /// Application port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Attached devices.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl StationConfig {
    /// Station endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.address, self.port)
    }
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Cloud server endpoint.
    pub cloud: EndpointConfig,
    /// Stations in set order.
    pub stations: Vec<StationConfig>,
}

impl NetworkConfig {
    /// Validate all stations and devices.
    ///
    /// Station addresses must be unique because the dispatch registry keys
    /// failures by address. Every endpoint (cloud, stations, devices) must be
    /// unique too, since frames are routed by endpoint.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending station or device.
    pub fn validate(&self) -> Result<(), String> {
        if self.stations.is_empty() {
            return Err("at least one station must be defined".into());
        }
        let cloud = Endpoint::from(self.cloud);
        let mut addresses = HashSet::new();
        let mut stations = HashSet::new();
        for station in &self.stations {
            if !addresses.insert(station.address) {
                return Err(format!("duplicate station address {}", station.address));
            }
            if station.address == self.cloud.address {
                return Err(format!(
                    "station {} shares the cloud address",
                    station.address
                ));
            }
            stations.insert(station.endpoint());
        }

        let mut devices = HashSet::new();
        for station in &self.stations {
            for device in &station.devices {
                device.validate().map_err(|e| {
                    format!(
                        "device {} of station {} invalid: {e}",
                        device.address, station.address
                    )
                })?;
                let endpoint = device.endpoint();
                let clash = if endpoint == cloud {
                    Some("the cloud")
                } else if stations.contains(&endpoint) {
                    Some("a station")
                } else if !devices.insert(endpoint) {
                    Some("another device")
                } else {
                    None
                };
                if let Some(other) = clash {
                    return Err(format!(
                        "device endpoint {endpoint} of station {} collides with {other}",
                        station.address
                    ));
                }
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `.env` if present, then read the file named by [`CONFIG_ENV_VAR`].
    ///
    /// # Errors
    ///
    /// Fails when the variable is unset, the file is unreadable or the
    /// contents do not validate.
    pub fn from_env() -> AppResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("no .env loaded: {e}");
        }
        let path = std::env::var(CONFIG_ENV_VAR)
            .with_context(|| format!("{CONFIG_ENV_VAR} is not set"))?;
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading network config from {path}"))?;
        Self::from_json_str(&raw).map_err(anyhow::Error::msg)
    }
}
