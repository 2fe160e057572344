//! # Edge Dispatch
//!
//! Task offloading dispatch for edge-computing networks.
//!
//! Tasks arrive at base stations, which decide under CPU, memory and budget
//! constraints whether to run a task on a locally attached device, forward it
//! to a sibling base station, or escalate it to a central cloud server.
//!
//! ## Core pieces
//!
//! - **Admission check**: first-fit over a station's device pool. A device is
//!   eligible iff `free_cpu > cpu_need`, `free_memory > mem_need` and
//!   `price <= budget`.
//! - **Primary cascade** (`DispatchRequest`): local device, otherwise report
//!   `DispatchFailed` to the cloud.
//! - **Peer cascade** (`OffloadRequest`): local device, otherwise the first
//!   sibling that has not failed the task yet, otherwise the cloud.
//! - **Dispatch registry**: shared, mutex-guarded record of which stations
//!   failed which task. It is what bounds the peer cascade to one visit per
//!   station.
//!
//! ## Running a network
//!
//! ```rust,ignore
//! use edge_dispatch::config::NetworkConfig;
//! use edge_dispatch::core::Task;
//! use edge_dispatch::runtime::Simulation;
//!
//! let cfg = NetworkConfig::from_json_str(raw_json)?;
//! let mut sim = Simulation::from_config(&cfg)?;
//!
//! sim.offload(Task::with_id("T1", 2.0, 1.0, 5.0)?, 0)?;
//! let report = sim.run()?;
//! assert!(sim.network().stations.registry().is_empty());
//! ```
//!
//! `runtime::ThreadedNetwork` runs the same network with one OS thread per
//! node over crossbeam channels.
//!
//! For complete scenarios, see:
//! - `tests/dispatch_cascade_test.rs` - Cascade properties and scenarios
//! - `tests/threaded_network_test.rs` - Concurrent stations

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Dispatch core: tasks, messages, devices, registry and stations.
pub mod core;
/// Configuration models for stations, devices and the cloud.
pub mod config;
/// Builders to wire a network from configuration.
pub mod builders;
/// Infrastructure adapters: message transports.
pub mod infra;
/// Runtime drivers: deterministic simulation and threaded workers.
pub mod runtime;
/// Shared utilities.
pub mod util;
