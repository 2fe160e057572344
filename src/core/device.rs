//! Edge devices and the resource pool a station dispatches into.
//!
//! The dispatch core only ever reads device capacity. Accounting happens on
//! the device side once a `HandleRequest` arrives, see [`EdgeDevice::on_handle`].

use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::Task;
use crate::util::serde::Endpoint;

/// Capacity figures a device exposes to the dispatch core.
pub trait EdgeDevice: Send + Sync {
    /// Network identity of the device.
    fn endpoint(&self) -> Endpoint;
    /// Free CPU cycles.
    fn free_cpu(&self) -> f64;
    /// Free memory.
    fn free_memory(&self) -> f64;
    /// Price charged for running a task.
    fn price(&self) -> f64;

    /// Called by the runtime when a `HandleRequest` for `task` reaches the device.
    fn on_handle(&self, _task: &Task) {}

    /// Admission predicate: strict on resources, non-strict on price.
    fn can_admit(&self, task: &Task) -> bool {
        self.free_cpu() > task.cpu_need()
            && self.free_memory() > task.mem_need()
            && self.price() <= task.budget()
    }
}

/// Mutable resource figures of a [`SimDevice`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceResources {
    /// Free CPU cycles.
    pub cpu: f64,
    /// Free memory.
    pub memory: f64,
    /// Price per task.
    pub price: f64,
}

/// In-memory device used by the simulation runtime and tests.
///
/// Accepting a task reserves its demand; nothing releases it, since task
/// execution time is not modelled.
#[derive(Debug)]
pub struct SimDevice {
    endpoint: Endpoint,
    resources: RwLock<DeviceResources>,
    handled: RwLock<Vec<Task>>,
}

impl SimDevice {
    /// Create a device with the given free capacity and price.
    #[must_use]
    pub fn new(endpoint: Endpoint, cpu: f64, memory: f64, price: f64) -> Self {
        Self {
            endpoint,
            resources: RwLock::new(DeviceResources { cpu, memory, price }),
            handled: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of current resources.
    #[must_use]
    pub fn resources(&self) -> DeviceResources {
        *self.resources.read()
    }

    /// Overwrite resources, e.g. to model background load.
    pub fn set_resources(&self, resources: DeviceResources) {
        *self.resources.write() = resources;
    }

    /// Tasks this device has accepted, in arrival order.
    #[must_use]
    pub fn handled(&self) -> Vec<Task> {
        self.handled.read().clone()
    }
}

impl EdgeDevice for SimDevice {
    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn free_cpu(&self) -> f64 {
        self.resources.read().cpu
    }

    fn free_memory(&self) -> f64 {
        self.resources.read().memory
    }

    fn price(&self) -> f64 {
        self.resources.read().price
    }

    fn on_handle(&self, task: &Task) {
        {
            let mut res = self.resources.write();
            res.cpu -= task.cpu_need();
            res.memory -= task.mem_need();
        }
        tracing::debug!(device = %self.endpoint, task = %task.id(), "device reserved resources");
        self.handled.write().push(task.clone());
    }
}

/// Ordered set of devices attached to one station. Order is the first-fit order.
#[derive(Clone, Default)]
pub struct DevicePool {
    devices: Vec<Arc<dyn EdgeDevice>>,
}

impl DevicePool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a device at the end of the first-fit order.
    pub fn push(&mut self, device: Arc<dyn EdgeDevice>) {
        self.devices.push(device);
    }

    /// Builder-style [`DevicePool::push`].
    #[must_use]
    pub fn with_device(mut self, device: Arc<dyn EdgeDevice>) -> Self {
        self.push(device);
        self
    }

    /// First device, in pool order, that admits `task`.
    #[must_use]
    pub fn first_fit(&self, task: &Task) -> Option<&Arc<dyn EdgeDevice>> {
        self.devices.iter().find(|d| d.can_admit(task))
    }

    /// Device with the given endpoint.
    #[must_use]
    pub fn find(&self, endpoint: Endpoint) -> Option<&Arc<dyn EdgeDevice>> {
        self.devices.iter().find(|d| d.endpoint() == endpoint)
    }

    /// Iterate devices in pool order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn EdgeDevice>> {
        self.devices.iter()
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// True when no device is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl std::fmt::Debug for DevicePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.devices.iter().map(|d| d.endpoint()))
            .finish()
    }
}

impl FromIterator<Arc<dyn EdgeDevice>> for DevicePool {
    fn from_iter<I: IntoIterator<Item = Arc<dyn EdgeDevice>>>(iter: I) -> Self {
        Self {
            devices: iter.into_iter().collect(),
        }
    }
}
