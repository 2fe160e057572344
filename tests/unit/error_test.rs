//! Tests for error types

use std::net::Ipv4Addr;

use edge_dispatch::core::{DispatchError, MessageKind};
use edge_dispatch::util::Endpoint;

#[test]
fn test_cloud_not_initialized_error() {
    let err = DispatchError::CloudNotInitialized;
    assert_eq!(format!("{}", err), "cloud server network is not initialized");
}

#[test]
fn test_index_out_of_range_error() {
    let err = DispatchError::IndexOutOfRange { index: 3, len: 3 };
    assert_eq!(format!("{}", err), "index out of range: 3 (len 3)");
}

#[test]
fn test_no_handler_error() {
    let err = DispatchError::NoHandler(MessageKind::HandleRequest);
    assert_eq!(format!("{}", err), "no handler registered for handle_request");
}

#[test]
fn test_cloud_not_linked_error() {
    let ep = Endpoint::new(Ipv4Addr::new(10, 1, 0, 1), 8860);
    let err = DispatchError::CloudNotLinked(ep);
    assert_eq!(
        format!("{}", err),
        "station 10.1.0.1:8860 is not linked to a cloud server"
    );
}

#[test]
fn test_config_error() {
    let err = DispatchError::Config("no stations".to_string());
    assert_eq!(format!("{}", err), "config invalid: no stations");
}
