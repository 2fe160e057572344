//! Tests for utility functions

use std::net::Ipv4Addr;

use edge_dispatch::util::{now_ms, Endpoint, TaskId};

#[test]
fn test_endpoint_equality() {
    let a = Endpoint::new(Ipv4Addr::new(10, 1, 0, 1), 8860);
    let b = Endpoint::new(Ipv4Addr::new(10, 1, 0, 1), 8861);
    assert_ne!(a, b);
    assert_eq!(a.address, b.address);
}

#[test]
fn test_endpoint_serde() {
    let ep = Endpoint::new(Ipv4Addr::new(10, 1, 0, 1), 8860);
    let json = serde_json::to_string(&ep).unwrap();
    assert_eq!(json, r#"{"address":"10.1.0.1","port":8860}"#);
}

#[test]
fn test_task_id_from_str() {
    let id = TaskId::from("T1");
    assert_eq!(id.as_str(), "T1");
    assert_eq!(id.to_string(), "T1");
}

#[test]
fn test_now_ms_advances() {
    assert!(now_ms() > 0);
}
