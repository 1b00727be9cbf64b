use std::sync::Arc;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::time::{timeout, Duration};

use hubsocket_core::error::Result;
use hubsocket_core::protocol::Envelope;

use crate::realtime::core::ConnectionRegistry;
use crate::realtime::types::ConnectionId;

/// Outbound push handle given to hubs.
///
/// Cheap to clone; every clone addresses the same registry.
#[derive(Clone)]
pub struct ClientProxy {
    registry: Arc<ConnectionRegistry>,
    send_timeout: Duration,
}

impl ClientProxy {
    pub fn new(registry: Arc<ConnectionRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Push `payload` to every registered connection. Returns how many sends
    /// reached a transport.
    pub async fn send_to_all(&self, payload: Value) -> Result<usize> {
        self.fan_out(None, Envelope::push(None, payload)).await
    }

    /// Same as `send_to_all`, skipping one connection (typically the caller).
    pub async fn send_to_all_except(
        &self,
        excluded: ConnectionId,
        method_name: Option<&str>,
        payload: Value,
    ) -> Result<usize> {
        let env = Envelope::push(method_name.map(str::to_string), payload);
        self.fan_out(Some(excluded), env).await
    }

    /// Push to one connection. An id that is no longer registered is a no-op
    /// (`Ok(false)`): the peer may have left between decision and send.
    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        method_name: &str,
        payload: Value,
    ) -> Result<bool> {
        let Some(conn) = self.registry.get(&id) else {
            tracing::debug!(conn_id = %id, method = method_name, "push target not connected");
            return Ok(false);
        };
        let text = Envelope::push(Some(method_name.to_string()), payload).encode()?;
        Ok(conn.send_text(text).await)
    }

    /// Serialize once, send concurrently, each send bounded by `send_timeout`.
    async fn fan_out(&self, excluded: Option<ConnectionId>, env: Envelope) -> Result<usize> {
        let text = env.encode()?;
        let send_timeout = self.send_timeout;

        let mut futs = FuturesUnordered::new();
        for conn in self.registry.snapshot() {
            if Some(conn.id()) == excluded {
                continue;
            }
            let registry = Arc::clone(&self.registry);
            let text = text.clone();
            futs.push(async move {
                // Re-check right before sending: the connection may have been
                // removed since the snapshot was taken.
                if !registry.contains(&conn.id()) || !conn.is_open() {
                    return false;
                }
                match timeout(send_timeout, conn.send_text(text)).await {
                    Ok(delivered) => delivered,
                    Err(_) => {
                        tracing::warn!(conn_id = %conn.id(), "broadcast send timed out");
                        false
                    }
                }
            });
        }

        let mut delivered = 0usize;
        while let Some(ok) = futs.next().await {
            if ok {
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}
