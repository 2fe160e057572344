//! Dispatch core: tasks, messages, devices, the registry and the stations.

pub mod error;
pub mod task;
pub mod message;
pub mod device;
pub mod transport;
pub mod registry;
pub mod audit;
pub mod cloud;
pub mod station;
pub mod station_set;

pub use error::{AppResult, DispatchError};
pub use task::Task;
pub use message::{Message, MessageKind};
pub use device::{DevicePool, DeviceResources, EdgeDevice, SimDevice};
pub use transport::{Packet, Transport};
pub use registry::DispatchRegistry;
pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use cloud::{CloudServer, CloudStats};
pub use station::{BaseStation, Escalation, RequestHandler};
pub use station_set::{StationServices, StationSet};
