//! Drives one connection from accept to teardown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument;

use hubsocket_core::error::Result;
use hubsocket_core::protocol::envelope::{METHOD_CONNECTED, METHOD_DISCONNECTED};
use hubsocket_core::protocol::Envelope;

use crate::dispatch::Dispatcher;
use crate::obs::HubMetrics;
use crate::realtime::{Connection, ConnectionId, ConnectionRegistry, LoopSettings};
use crate::transport::frame::{FrameReader, FrameWriter};

pub struct Acceptor {
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<Dispatcher>,
    settings: LoopSettings,
    inbound_queue: usize,
    metrics: Arc<HubMetrics>,
    /// Connections between accept and the end of `OnDisconnected`.
    live: AtomicUsize,
}

impl Acceptor {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        dispatcher: Arc<Dispatcher>,
        settings: LoopSettings,
        inbound_queue: usize,
        metrics: Arc<HubMetrics>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            settings,
            inbound_queue: inbound_queue.max(1),
            metrics,
            live: AtomicUsize::new(0),
        }
    }

    /// Connections whose teardown (including `OnDisconnected`) has not finished.
    pub fn live_connections(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Run a freshly accepted transport until it closes.
    ///
    /// Order: register, `OnConnected`, bootstrap push, receive loop (calls
    /// dispatched in arrival order by a per-connection worker), dispose,
    /// deregister, drain worker, `OnDisconnected`. A failed deregistration is
    /// returned after the disconnect notification has run.
    pub async fn accept<R, W>(&self, mut reader: R, writer: W) -> Result<ConnectionId>
    where
        R: FrameReader,
        W: FrameWriter + 'static,
    {
        let id = ConnectionId::new();
        let conn = Arc::new(
            Connection::new(id, Box::new(writer)).with_write_timeout(self.settings.write_timeout),
        );
        let span = tracing::info_span!("conn", conn_id = %id);

        self.live.fetch_add(1, Ordering::AcqRel);
        let result = self.run(conn, &mut reader).instrument(span).await;
        self.live.fetch_sub(1, Ordering::AcqRel);
        result
    }

    async fn run<R>(&self, conn: Arc<Connection>, reader: &mut R) -> Result<ConnectionId>
    where
        R: FrameReader,
    {
        let id = conn.id();
        self.registry.add_or_update(Arc::clone(&conn));
        self.metrics.connections_accepted.inc(&[]);
        self.metrics.connections_active.inc(&[]);
        tracing::info!(active = self.registry.len(), "connection accepted");

        self.dispatcher
            .dispatch_lifecycle(&conn, METHOD_CONNECTED)
            .await;

        if let Err(e) = conn.send(&Envelope::bootstrap(&id.to_string())).await {
            tracing::warn!(error = %e, "bootstrap message not sent");
        }

        let (tx, mut rx) = mpsc::channel::<String>(self.inbound_queue);
        let worker = {
            let dispatcher = Arc::clone(&self.dispatcher);
            let conn = Arc::clone(&conn);
            tokio::spawn(
                async move {
                    while let Some(text) = rx.recv().await {
                        dispatcher.dispatch_text(&conn, &text).await;
                    }
                }
                .in_current_span(),
            )
        };

        let exit = conn.receive_loop(reader, &self.settings, &tx).await;
        drop(tx);
        self.metrics
            .connection_exits
            .inc(&[("reason", exit.as_str())]);

        conn.dispose().await;
        let removed = self.registry.remove(&id);
        self.metrics.connections_active.dec(&[]);

        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "dispatch worker ended abnormally");
        }

        self.dispatcher
            .dispatch_lifecycle(&conn, METHOD_DISCONNECTED)
            .await;
        tracing::info!(reason = exit.as_str(), active = self.registry.len(), "connection closed");

        removed.map(|_| id)
    }
}
