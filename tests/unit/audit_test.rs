//! Tests for audit sink

use edge_dispatch::core::{build_audit_event, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    let event = build_audit_event("T1", "10.1.0.1:8860", "handle", "10.2.0.1:8860");

    sink.record(event);
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].task_id, "T1");
    assert_eq!(events[0].station, "10.1.0.1:8860");
    assert_eq!(events[0].action, "handle");
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("T1", "s", "handle", "d"));
    sink.record(build_audit_event("T2", "s", "handle", "d"));
    sink.record(build_audit_event("T3", "s", "handle", "d"));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, "T2"); // First one popped
    assert_eq!(events[1].task_id, "T3");
}

#[test]
fn test_events_for_filters_by_task() {
    let sink = InMemoryAuditSink::new(10);
    sink.record(build_audit_event("T1", "a", "forward_sibling", "b"));
    sink.record(build_audit_event("T2", "a", "handle", "d"));
    sink.record(build_audit_event("T1", "b", "fallback_cloud", "c"));

    let t1 = sink.events_for("T1");
    assert_eq!(t1.len(), 2);
    assert_eq!(t1[1].action, "fallback_cloud");
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event("T1", "10.1.0.1:8860", "fallback_cloud", "10.0.0.1:8860");

    assert!(event.event_id.starts_with("T1-fallback_cloud-"));
    assert_eq!(event.target, "10.0.0.1:8860");
    assert!(event.created_at_ms > 0);
}
