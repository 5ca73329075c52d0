use std::sync::Arc;

use pairline::models::ServerEvent;
use pairline::services::registry::{ConnectionHandle, ConnectionRegistry, Frame};
use tokio::sync::mpsc::UnboundedReceiver;

fn typing(user_id: i64) -> ServerEvent {
    ServerEvent::Typing { user_id }
}

fn drain(rx: &mut UnboundedReceiver<Frame>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        events.push(serde_json::from_str(frame.as_str()).expect("Invalid frame"));
    }
    events
}

#[test_log::test]
fn join_allocates_room_and_allows_multiple_devices() {
    let registry = ConnectionRegistry::new();
    let (phone, _phone_rx) = ConnectionHandle::new(1);
    let (laptop, _laptop_rx) = ConnectionHandle::new(1);

    assert!(!registry.contains_room(7));
    registry.join(7, phone);
    registry.join(7, laptop);

    assert!(registry.contains_room(7));
    assert_eq!(registry.connection_count(7), 2);
    assert_eq!(registry.room_count(), 1);
}

#[test_log::test]
fn leave_removes_only_the_given_connection() {
    let registry = ConnectionRegistry::new();
    let (a, _a_rx) = ConnectionHandle::new(1);
    let (b, mut b_rx) = ConnectionHandle::new(2);
    let a_id = a.id();

    registry.join(7, a);
    registry.join(7, b);

    assert!(registry.leave(7, a_id));
    assert_eq!(registry.connection_count(7), 1);

    // A second leave for the same connection is a no-op
    assert!(!registry.leave(7, a_id));
    assert_eq!(registry.connection_count(7), 1);

    assert_eq!(registry.broadcast(7, &typing(9), None), 1);
    assert_eq!(drain(&mut b_rx).len(), 1);
}

#[test_log::test]
fn duplicate_join_needs_matching_number_of_leaves() {
    let registry = ConnectionRegistry::new();
    let (a, mut a_rx) = ConnectionHandle::new(1);
    let a_id = a.id();

    registry.join(7, a.clone());
    registry.join(7, a);
    assert_eq!(registry.connection_count(7), 2);

    assert!(registry.leave(7, a_id));
    assert_eq!(registry.connection_count(7), 1);
    assert_eq!(registry.broadcast(7, &typing(9), None), 1);
    assert_eq!(drain(&mut a_rx).len(), 1);

    assert!(registry.leave(7, a_id));
    assert!(!registry.contains_room(7));
}

#[test_log::test]
fn leave_unknown_room_is_noop() {
    let registry = ConnectionRegistry::new();
    let (a, _rx) = ConnectionHandle::new(1);

    assert!(!registry.leave(42, a.id()));
    assert_eq!(registry.room_count(), 0);
}

#[test_log::test]
fn last_leave_removes_room_entry() {
    let registry = ConnectionRegistry::new();
    let (a, mut a_rx) = ConnectionHandle::new(1);
    let a_id = a.id();

    registry.join(7, a);
    assert!(registry.leave(7, a_id));

    assert!(!registry.contains_room(7));
    assert_eq!(registry.room_count(), 0);

    // Broadcasting afterwards neither resurrects the room nor reaches the old handle
    assert_eq!(registry.broadcast(7, &typing(1), None), 0);
    assert!(!registry.contains_room(7));
    assert!(drain(&mut a_rx).is_empty());
}

#[test_log::test]
fn broadcast_to_empty_room_is_noop() {
    let registry = ConnectionRegistry::new();

    assert_eq!(registry.broadcast(99, &typing(1), None), 0);
    assert_eq!(registry.room_count(), 0);
}

#[test_log::test]
fn broadcast_skips_excluded_connection_only() {
    let registry = ConnectionRegistry::new();
    let (sender, mut sender_rx) = ConnectionHandle::new(1);
    let (sender_other_device, mut other_device_rx) = ConnectionHandle::new(1);
    let (partner, mut partner_rx) = ConnectionHandle::new(2);
    let sender_id = sender.id();

    registry.join(7, sender);
    registry.join(7, sender_other_device);
    registry.join(7, partner);

    let delivered = registry.broadcast(7, &typing(1), Some(sender_id));
    assert_eq!(delivered, 2);

    assert!(drain(&mut sender_rx).is_empty());
    assert_eq!(drain(&mut other_device_rx).len(), 1);

    let events = drain(&mut partner_rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ServerEvent::Typing { user_id: 1 }));
}

#[test_log::test]
fn broadcast_without_exclusion_reaches_everyone() {
    let registry = ConnectionRegistry::new();
    let (a, mut a_rx) = ConnectionHandle::new(1);
    let (b, mut b_rx) = ConnectionHandle::new(2);

    registry.join(7, a);
    registry.join(7, b);

    assert_eq!(registry.broadcast(7, &ServerEvent::Read { user_id: 2 }, None), 2);
    assert!(matches!(drain(&mut a_rx)[..], [ServerEvent::Read { user_id: 2 }]));
    assert!(matches!(drain(&mut b_rx)[..], [ServerEvent::Read { user_id: 2 }]));
}

#[test_log::test]
fn broadcast_is_scoped_to_room() {
    let registry = ConnectionRegistry::new();
    let (a, mut a_rx) = ConnectionHandle::new(1);
    let (b, mut b_rx) = ConnectionHandle::new(2);

    registry.join(7, a);
    registry.join(8, b);

    assert_eq!(registry.broadcast(7, &typing(1), None), 1);
    assert_eq!(drain(&mut a_rx).len(), 1);
    assert!(drain(&mut b_rx).is_empty());
}

#[test_log::test]
fn failed_delivery_does_not_stop_fanout_and_evicts_dead_handle() {
    let registry = ConnectionRegistry::new();
    let (dead, dead_rx) = ConnectionHandle::new(1);
    let (alive, mut alive_rx) = ConnectionHandle::new(2);
    drop(dead_rx);

    registry.join(7, dead);
    registry.join(7, alive);

    assert_eq!(registry.broadcast(7, &typing(3), None), 1);
    assert_eq!(drain(&mut alive_rx).len(), 1);
    assert_eq!(registry.connection_count(7), 1);
}

#[test_log::test]
fn room_with_only_dead_handles_is_pruned() {
    let registry = ConnectionRegistry::new();
    let (dead, dead_rx) = ConnectionHandle::new(1);
    drop(dead_rx);

    registry.join(7, dead);
    assert_eq!(registry.broadcast(7, &typing(1), None), 0);
    assert!(!registry.contains_room(7));
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_joins_and_leaves_keep_exact_membership() {
    let registry = Arc::new(ConnectionRegistry::new());
    let mut tasks = Vec::new();

    for i in 0..64_i64 {
        let registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            let (handle, rx) = ConnectionHandle::new(i);
            let id = handle.id();
            registry.join(1, handle);
            registry.broadcast(1, &ServerEvent::Typing { user_id: i }, Some(id));
            // Odd connections leave again, even ones stay
            if i % 2 == 1 {
                assert!(registry.leave(1, id));
            }
            rx
        }));
    }

    let mut receivers = Vec::new();
    for task in tasks {
        receivers.push(task.await.unwrap());
    }

    assert_eq!(registry.connection_count(1), 32);
    assert_eq!(registry.broadcast(1, &typing(0), None), 32);
}
