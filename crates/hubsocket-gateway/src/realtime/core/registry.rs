use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use hubsocket_core::error::{HubSocketError, Result};

use crate::realtime::core::Connection;
use crate::realtime::types::ConnectionId;

#[derive(Clone)]
struct ConnectionEntry {
    conn: Arc<Connection>,
    created_seq: u64,
}

/// Connection registry: `connection id -> Connection`.
///
/// The one structure shared by every connection task. All operations take
/// `&self`; synchronization is internal (sharded locks).
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionEntry>,
    seq: AtomicU64,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Insert or replace the entry for `conn.id()`.
    pub fn add_or_update(&self, conn: Arc<Connection>) {
        let created_seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.connections
            .insert(conn.id(), ConnectionEntry { conn, created_seq });
    }

    /// Remove and return the entry. Removing an id that is not registered is
    /// a contract violation (double removal) and fails loudly.
    pub fn remove(&self, id: &ConnectionId) -> Result<Arc<Connection>> {
        self.connections
            .remove(id)
            .map(|(_, entry)| entry.conn)
            .ok_or_else(|| HubSocketError::UnknownConnection(id.to_string()))
    }

    pub fn get(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|r| Arc::clone(&r.value().conn))
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Registered ids, oldest connection first.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.snapshot().iter().map(|c| c.id()).collect()
    }

    /// Point-in-time copy of the registered connections, oldest first.
    ///
    /// Shard guards are released before this returns, so callers can await
    /// on sends without blocking concurrent add/remove.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        let mut entries: Vec<ConnectionEntry> =
            self.connections.iter().map(|r| r.value().clone()).collect();
        entries.sort_by_key(|e| e.created_seq);
        entries.into_iter().map(|e| e.conn).collect()
    }
}
