//! Tests for the station set: construction, bounds and cloud linkage

use std::net::Ipv4Addr;
use std::sync::Arc;

use edge_dispatch::core::{
    CloudServer, DispatchError, Message, MessageKind, StationSet, Task, Transport,
};
use edge_dispatch::infra::{ChannelTransport, InMemoryTransport};
use edge_dispatch::util::{Endpoint, TaskId};

fn station_endpoint(i: usize) -> Endpoint {
    Endpoint::new(Ipv4Addr::new(10, 1, 0, u8::try_from(i + 1).unwrap()), 8860)
}

fn make_set(n: usize) -> (StationSet, Arc<InMemoryTransport>) {
    let transport = Arc::new(InMemoryTransport::new());
    let set = StationSet::new(n, Arc::clone(&transport) as Arc<dyn Transport>, station_endpoint);
    (set, transport)
}

#[test]
fn test_set_builds_requested_count_in_order() {
    let (set, _) = make_set(4);
    assert_eq!(set.len(), 4);
    for (i, bs) in set.iter().enumerate() {
        assert_eq!(bs.endpoint(), station_endpoint(i));
    }
    assert_eq!(set.find(station_endpoint(2)).unwrap().address(), Ipv4Addr::new(10, 1, 0, 3));
}

#[test]
fn test_get_out_of_range() {
    let (set, _) = make_set(3);
    assert!(set.get(2).is_ok());
    let err = set.get(3).unwrap_err();
    assert!(matches!(err, DispatchError::IndexOutOfRange { index: 3, len: 3 }));
}

#[test]
#[should_panic(expected = "index out of range")]
fn test_index_panics_out_of_range() {
    let (set, _) = make_set(2);
    let _ = &set[2];
}

#[test]
fn test_connect_devices_out_of_range() {
    let (set, _) = make_set(1);
    assert!(set.connect_devices(5, Default::default()).is_err());
}

#[test]
fn test_stations_share_registry() {
    let (set, _) = make_set(2);
    let t = TaskId::from("T1");
    set[0].record_failure(&t);
    assert!(set[1].has_failed(&t, set[0].address()));
    assert!(set.has_failed(&t, set[0].address()));
    set.clear(&t);
    assert!(!set[1].has_failed(&t, set[0].address()));
}

#[test]
fn test_link_uninitialized_cloud_fails() {
    let (set, transport) = make_set(2);
    let cloud = CloudServer::new(transport);
    let err = set.link_cloud(&cloud).unwrap_err();
    assert!(matches!(err, DispatchError::CloudNotInitialized));
    assert!(set[0].cloud_endpoint().is_none());
}

#[test]
fn test_link_cloud_once() {
    let (set, transport) = make_set(2);
    let cloud = CloudServer::new(transport);
    assert!(cloud.install_network(Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 8860)));
    set.link_cloud(&cloud).unwrap();
    assert!(matches!(
        set[1].link_cloud(&cloud),
        Err(DispatchError::CloudAlreadyLinked(_))
    ));
}

#[test]
fn test_unlinked_station_rejects_dispatch_request() {
    let (set, _) = make_set(1);
    let task = Task::with_id("T1", 1.0, 1.0, 1.0).unwrap();
    let frame = Message::new(MessageKind::DispatchRequest, task).to_bytes().unwrap();
    let err = set[0].receive(&frame, station_endpoint(9)).unwrap_err();
    assert!(matches!(err, DispatchError::CloudNotLinked(_)));
}

#[test]
fn test_receive_without_handler() {
    let (set, _) = make_set(1);
    let task = Task::with_id("T1", 1.0, 1.0, 1.0).unwrap();
    let frame = Message::new(MessageKind::DispatchSucceeded, task).to_bytes().unwrap();
    let err = set[0].receive(&frame, station_endpoint(9)).unwrap_err();
    assert!(matches!(err, DispatchError::NoHandler(MessageKind::DispatchSucceeded)));
}

#[test]
fn test_set_wide_handler_override() {
    let (set, transport) = make_set(3);
    set.set_request_handler(MessageKind::DispatchSucceeded, |bs, mut msg, from| {
        msg.set_kind(MessageKind::HandleRequest);
        bs.write(&msg, from)
    });

    let task = Task::with_id("T1", 1.0, 1.0, 1.0).unwrap();
    let frame = Message::new(MessageKind::DispatchSucceeded, task).to_bytes().unwrap();
    for bs in &set {
        bs.receive(&frame, station_endpoint(9)).unwrap();
    }

    let sent = transport.drain();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|p| p.to == station_endpoint(9)));
}

fn offload_frame(id: &str) -> Vec<u8> {
    let task = Task::with_id(id, 1.0, 1.0, 1.0).unwrap();
    Message::new(MessageKind::OffloadRequest, task).to_bytes().unwrap()
}

#[test]
fn test_exhausted_cascade_without_cloud_leaves_no_records() {
    let (set, transport) = make_set(2);
    let t = TaskId::from("T1");
    set[1].record_failure(&t);

    let err = set[0].receive(&offload_frame("T1"), station_endpoint(9)).unwrap_err();

    assert!(matches!(err, DispatchError::CloudNotLinked(_)));
    assert!(!set.has_failed(&t, set[0].address()));
    assert!(!set.has_failed(&t, set[1].address()));
    assert!(set.registry().is_empty());
    assert!(transport.is_empty());
}

#[test]
fn test_failed_sibling_forward_leaves_no_records() {
    // No inbox is registered, so forwarding to the sibling fails.
    let transport = Arc::new(ChannelTransport::new());
    let set = StationSet::new(2, transport as Arc<dyn Transport>, station_endpoint);

    let err = set[0].receive(&offload_frame("T1"), station_endpoint(9)).unwrap_err();

    assert!(matches!(err, DispatchError::UnknownEndpoint(ep) if ep == station_endpoint(1)));
    assert!(set.registry().is_empty());
}
