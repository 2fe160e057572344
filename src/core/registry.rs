//! Shared dispatch record registry.
//!
//! Tracks, per task, which stations already tried and failed to place it.
//! The peer cascade consults it to never revisit a station, which bounds the
//! cascade to one visit per station.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

use parking_lot::Mutex;

use crate::util::serde::TaskId;

/// Task id → addresses of stations that failed it.
///
/// All operations take the same lock, so concurrent writers from different
/// stations observe a single order.
#[derive(Debug, Default)]
pub struct DispatchRegistry {
    records: Mutex<HashMap<TaskId, HashSet<Ipv4Addr>>>,
}

impl DispatchRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `station` failed `task_id`. Idempotent.
    pub fn record_failure(&self, task_id: &TaskId, station: Ipv4Addr) {
        let mut records = self.records.lock();
        let inserted = records.entry(task_id.clone()).or_default().insert(station);
        tracing::debug!(task = %task_id, %station, inserted, "dispatch failure recorded");
    }

    /// Whether `station` is recorded as having failed `task_id`.
    #[must_use]
    pub fn has_failed(&self, task_id: &TaskId, station: Ipv4Addr) -> bool {
        self.records
            .lock()
            .get(task_id)
            .is_some_and(|stations| stations.contains(&station))
    }

    /// Drop every record for `task_id`. Returns whether an entry existed.
    pub fn clear(&self, task_id: &TaskId) -> bool {
        let removed = self.records.lock().remove(task_id).is_some();
        if removed {
            tracing::debug!(task = %task_id, "dispatch records cleared");
        }
        removed
    }

    /// Stations recorded for `task_id`, sorted by address.
    #[must_use]
    pub fn failed_stations(&self, task_id: &TaskId) -> Vec<Ipv4Addr> {
        let mut stations: Vec<_> = self
            .records
            .lock()
            .get(task_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        stations.sort_unstable();
        stations
    }

    /// Number of tasks with open records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when no task has open records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}
