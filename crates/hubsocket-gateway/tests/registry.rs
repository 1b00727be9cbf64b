#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;

use hubsocket_gateway::realtime::{Connection, ConnectionId, ConnectionRegistry};

fn connection() -> Arc<Connection> {
    let (_peer, _reader, writer) = common::pipe();
    Arc::new(Connection::new(ConnectionId::new(), Box::new(writer)))
}

#[test]
fn add_get_remove() {
    let registry = ConnectionRegistry::new();
    let conn = connection();
    let id = conn.id();

    registry.add_or_update(Arc::clone(&conn));
    assert!(registry.contains(&id));
    assert_eq!(registry.len(), 1);
    assert!(Arc::ptr_eq(&registry.get(&id).unwrap(), &conn));

    let removed = registry.remove(&id).unwrap();
    assert!(Arc::ptr_eq(&removed, &conn));
    assert!(registry.is_empty());
    assert!(registry.get(&id).is_none());
}

#[test]
fn double_remove_fails_with_unknown_connection() {
    let registry = ConnectionRegistry::new();
    let conn = connection();
    let id = conn.id();
    registry.add_or_update(conn);

    registry.remove(&id).unwrap();
    let err = registry.remove(&id).expect_err("second removal must fail");
    assert_eq!(err.client_code().as_str(), "UNKNOWN_CONNECTION");
    assert!(err.to_string().contains(&id.to_string()));
}

#[test]
fn add_or_update_replaces_existing_entry() {
    let registry = ConnectionRegistry::new();
    let first = connection();
    let id = first.id();
    let (_peer, _reader, writer) = common::pipe();
    let second = Arc::new(Connection::new(id, Box::new(writer)));

    registry.add_or_update(first);
    registry.add_or_update(Arc::clone(&second));

    assert_eq!(registry.len(), 1);
    assert!(Arc::ptr_eq(&registry.get(&id).unwrap(), &second));
}

#[test]
fn snapshot_is_oldest_first() {
    let registry = ConnectionRegistry::new();
    let conns: Vec<_> = (0..5).map(|_| connection()).collect();
    for c in &conns {
        registry.add_or_update(Arc::clone(c));
    }

    let expected: Vec<ConnectionId> = conns.iter().map(|c| c.id()).collect();
    assert_eq!(registry.ids(), expected);

    registry.remove(&expected[2]).unwrap();
    let snapshot: Vec<ConnectionId> = registry.snapshot().iter().map(|c| c.id()).collect();
    assert_eq!(snapshot, vec![expected[0], expected[1], expected[3], expected[4]]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_add_and_remove() {
    let registry = Arc::new(ConnectionRegistry::new());

    let mut tasks = Vec::new();
    for _ in 0..64 {
        let registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            let conn = connection();
            let id = conn.id();
            registry.add_or_update(conn);
            tokio::task::yield_now().await;
            assert!(registry.contains(&id));
            registry.remove(&id).map(|_| ())
        }));
    }

    for t in tasks {
        t.await.unwrap().unwrap();
    }
    assert!(registry.is_empty());
}

#[test]
fn default_registry_orders_like_new() {
    let registry = ConnectionRegistry::default();
    let conns: Vec<_> = (0..3).map(|_| connection()).collect();
    for c in &conns {
        registry.add_or_update(Arc::clone(c));
    }

    let expected: Vec<ConnectionId> = conns.iter().map(|c| c.id()).collect();
    assert_eq!(registry.ids(), expected);
}
