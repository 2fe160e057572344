//! Drivers that deliver frames to stations, devices and the cloud.

pub mod simulation;
#[cfg(not(target_arch = "wasm32"))]
pub mod worker;

pub use simulation::{Simulation, SimulationReport, DEFAULT_MAX_STEPS};
#[cfg(not(target_arch = "wasm32"))]
pub use worker::{spawn_node_worker, NodeHandle, ThreadedNetwork};
