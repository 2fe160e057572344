//! Audit trail of dispatch decisions.
//!
//! Stations record one event per decision. The in-memory sink is what tests
//! use to check cascade properties such as "no station visited twice".

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::util::clock::now_ms;

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related task identifier.
    pub task_id: String,
    /// Station that took the decision.
    pub station: String,
    /// Action taken (handle, dispatch_failed, forward_sibling, fallback_cloud).
    pub action: String,
    /// Endpoint the message was sent to.
    pub target: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction. Shared between stations, so it records through `&self`.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events for one task, in recording order.
    #[must_use]
    pub fn events_for(&self, task_id: &str) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Sink that forwards events to `tracing` at info level.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            event_id = %event.event_id,
            task = %event.task_id,
            station = %event.station,
            action = %event.action,
            target = %event.target,
            "dispatch audit"
        );
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    task_id: impl Into<String>,
    station: impl Into<String>,
    action: impl Into<String>,
    target: impl Into<String>,
) -> AuditEvent {
    let task_id = task_id.into();
    let action = action.into();
    let created_at_ms = now_ms();
    AuditEvent {
        event_id: format!("{task_id}-{action}-{}", uuid::Uuid::new_v4().simple()),
        task_id,
        station: station.into(),
        action,
        target: target.into(),
        created_at_ms,
    }
}
