#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

//! In-memory transport and gateway harness shared by the integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use hubsocket_core::error::{HubSocketError, Result};
use hubsocket_core::protocol::envelope::METHOD_SOCKET_CONNECTED;
use hubsocket_core::protocol::Envelope;
use hubsocket_gateway::app_state::AppState;
use hubsocket_gateway::config::GatewayConfig;
use hubsocket_gateway::hub::HubRegistry;
use hubsocket_gateway::hubs;
use hubsocket_gateway::realtime::ConnectionId;
use hubsocket_gateway::transport::{FrameReader, FrameWriter, ReadResult};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// What the peer pushes into the server's reader.
pub enum Inbound {
    Message(Vec<u8>),
    Ping,
    Close,
    Fail,
}

/// What the server's writer emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Ping,
    Close,
}

/// Reader half: hands out each message in reads of at most one buffer.
pub struct MemoryReader {
    rx: mpsc::UnboundedReceiver<Inbound>,
    pending: Vec<u8>,
    offset: usize,
    in_message: bool,
    reads: Arc<AtomicUsize>,
}

#[async_trait]
impl FrameReader for MemoryReader {
    async fn read_frame(&mut self, buf: &mut [u8]) -> Result<ReadResult> {
        if !self.in_message {
            match self.rx.recv().await {
                None | Some(Inbound::Close) => return Ok(ReadResult::Closed),
                Some(Inbound::Ping) => return Ok(ReadResult::Control),
                Some(Inbound::Fail) => {
                    return Err(HubSocketError::Transport("connection reset by peer".into()))
                }
                Some(Inbound::Message(bytes)) => {
                    self.pending = bytes;
                    self.offset = 0;
                    self.in_message = true;
                }
            }
        }

        self.reads.fetch_add(1, Ordering::Relaxed);
        let count = (self.pending.len() - self.offset).min(buf.len());
        buf[..count].copy_from_slice(&self.pending[self.offset..self.offset + count]);
        self.offset += count;
        let end_of_message = self.offset == self.pending.len();
        if end_of_message {
            self.in_message = false;
        }
        Ok(ReadResult::Data { count, end_of_message })
    }
}

pub struct MemoryWriter {
    tx: mpsc::UnboundedSender<Outbound>,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl FrameWriter for MemoryWriter {
    async fn write_text(&mut self, text: String) -> Result<()> {
        if self.fail.load(Ordering::Acquire) {
            return Err(HubSocketError::Transport("broken pipe".into()));
        }
        self.tx
            .send(Outbound::Text(text))
            .map_err(|_| HubSocketError::Transport("peer gone".into()))
    }

    async fn write_ping(&mut self) -> Result<()> {
        if self.fail.load(Ordering::Acquire) {
            return Err(HubSocketError::Transport("broken pipe".into()));
        }
        self.tx
            .send(Outbound::Ping)
            .map_err(|_| HubSocketError::Transport("peer gone".into()))
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.tx.send(Outbound::Close);
        Ok(())
    }
}

/// The test's end of the pipe.
pub struct Peer {
    inbound: mpsc::UnboundedSender<Inbound>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    pub fail_writes: Arc<AtomicBool>,
    pub reads: Arc<AtomicUsize>,
}

pub fn pipe() -> (Peer, MemoryReader, MemoryWriter) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let fail = Arc::new(AtomicBool::new(false));
    let reads = Arc::new(AtomicUsize::new(0));

    let peer = Peer {
        inbound: in_tx,
        outbound: out_rx,
        fail_writes: Arc::clone(&fail),
        reads: Arc::clone(&reads),
    };
    let reader = MemoryReader {
        rx: in_rx,
        pending: Vec::new(),
        offset: 0,
        in_message: false,
        reads,
    };
    let writer = MemoryWriter { tx: out_tx, fail };
    (peer, reader, writer)
}

impl Peer {
    pub fn send_bytes(&self, bytes: Vec<u8>) {
        let _ = self.inbound.send(Inbound::Message(bytes));
    }

    pub fn send_text(&self, text: &str) {
        self.send_bytes(text.as_bytes().to_vec());
    }

    pub fn call(&self, method: &str, data: Value, promise_id: Option<Value>) {
        let text = Envelope::call(method, data, promise_id).encode().unwrap();
        self.send_text(&text);
    }

    pub fn ping(&self) {
        let _ = self.inbound.send(Inbound::Ping);
    }

    pub fn close(&self) {
        let _ = self.inbound.send(Inbound::Close);
    }

    pub fn fail_read(&self) {
        let _ = self.inbound.send(Inbound::Fail);
    }

    /// Next outbound event, or `None` on timeout / writer dropped.
    pub async fn next_outbound(&mut self, within: Duration) -> Option<Outbound> {
        tokio::time::timeout(within, self.outbound.recv())
            .await
            .ok()
            .flatten()
    }

    /// Next text message, skipping heartbeats.
    pub async fn recv_text(&mut self) -> String {
        loop {
            match self.next_outbound(RECV_TIMEOUT).await {
                Some(Outbound::Text(text)) => return text,
                Some(Outbound::Ping) => continue,
                other => panic!("expected a text message, got {other:?}"),
            }
        }
    }

    pub async fn recv(&mut self) -> Envelope {
        let text = self.recv_text().await;
        Envelope::decode(&text).unwrap()
    }

    /// Asserts no text message arrives within `within`.
    pub async fn expect_silence(&mut self, within: Duration) {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            let left = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(left, self.outbound.recv()).await {
                Err(_) => return,
                Ok(Some(Outbound::Ping)) => continue,
                Ok(other) => panic!("expected silence, got {other:?}"),
            }
        }
    }

    /// Waits for the close frame (or the writer being released).
    pub async fn wait_closed(&mut self) {
        loop {
            match self.next_outbound(RECV_TIMEOUT).await {
                Some(Outbound::Close) | None => return,
                Some(_) => continue,
            }
        }
    }
}

/// Small buffer so every realistic message spans several reads.
pub fn test_config() -> GatewayConfig {
    let mut cfg = GatewayConfig::default();
    cfg.connection.read_buffer_bytes = 16;
    cfg.dispatch.hub_call_timeout_ms = 300;
    cfg.dispatch.broadcast_send_timeout_ms = 200;
    cfg
}

pub fn builtin_state() -> AppState {
    let mut registry = HubRegistry::new();
    hubs::register_builtin(&mut registry).unwrap();
    AppState::new(test_config(), registry).unwrap()
}

/// A connected peer plus the task running its server side.
pub struct Client {
    pub peer: Peer,
    pub id: ConnectionId,
    pub task: JoinHandle<Result<ConnectionId>>,
}

impl Client {
    pub async fn disconnect(self) -> Result<ConnectionId> {
        self.peer.close();
        tokio::time::timeout(RECV_TIMEOUT, self.task)
            .await
            .expect("connection task did not finish")
            .expect("connection task panicked")
    }
}

/// Accept an in-memory connection and consume its bootstrap push.
pub async fn connect(state: &AppState) -> Client {
    let (mut peer, reader, writer) = pipe();
    let st = state.clone();
    let task = tokio::spawn(async move { st.acceptor().accept(reader, writer).await });

    let boot = peer.recv().await;
    assert_eq!(boot.method_name.as_deref(), Some(METHOD_SOCKET_CONNECTED));
    assert_eq!(boot.promise_id, None);
    let id: ConnectionId = boot.data.as_str().expect("id is a string").parse().unwrap();

    Client { peer, id, task }
}
