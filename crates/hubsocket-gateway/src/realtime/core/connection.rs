use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::{timeout, Duration, Instant, MissedTickBehavior};

use hubsocket_core::error::Result;
use hubsocket_core::protocol::{Envelope, FrameAccumulator};

use crate::config::GatewayConfig;
use crate::realtime::types::{ConnectionId, ConnectionState, LoopExit};
use crate::transport::frame::{FrameReader, FrameWriter, ReadResult};

/// Receive loop tuning, taken from config once per connection.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub read_buffer_bytes: usize,
    pub ping_interval: Duration,
    pub idle_timeout: Duration,
    pub write_timeout: Duration,
}

impl LoopSettings {
    pub fn from_config(cfg: &GatewayConfig) -> Self {
        Self {
            read_buffer_bytes: cfg.connection.read_buffer_bytes,
            ping_interval: Duration::from_millis(cfg.gateway.ping_interval_ms),
            idle_timeout: Duration::from_millis(cfg.gateway.idle_timeout_ms),
            write_timeout: Duration::from_millis(cfg.connection.write_timeout_ms),
        }
    }
}

/// Used when a connection is built without `with_write_timeout`.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// One live duplex channel.
///
/// The connection owns the write half of its transport; the read half is
/// borrowed by `receive_loop` for the lifetime of the loop. Writes go through a
/// per-connection lock so replies and pushes from other tasks never interleave.
/// Waiting for the lock plus the write itself is bounded by `write_timeout`;
/// a peer that stops reading is closed rather than stalling its callers.
pub struct Connection {
    id: ConnectionId,
    state: AtomicU8,
    writer: Mutex<Option<Box<dyn FrameWriter>>>,
    closing: Notify,
    write_timeout: Duration,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(id: ConnectionId, writer: Box<dyn FrameWriter>) -> Self {
        Self {
            id,
            state: AtomicU8::new(ConnectionState::Open as u8),
            writer: Mutex::new(Some(writer)),
            closing: Notify::new(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Serialize and write one envelope as a single text frame.
    ///
    /// Sending on a connection that is no longer open is a no-op. A failed
    /// write moves the connection to Closing; only encode failures are
    /// returned to the caller.
    pub async fn send(&self, env: &Envelope) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        let text = env.encode()?;
        self.send_text(text).await;
        Ok(())
    }

    /// Write an already-encoded message. Returns whether it reached the transport.
    pub async fn send_text(&self, text: String) -> bool {
        self.write(Outgoing::Text(text)).await
    }

    /// Heartbeat ping, same ordering and timeout rules as `send`.
    pub async fn ping(&self) {
        self.write(Outgoing::Ping).await;
    }

    async fn write(&self, frame: Outgoing) -> bool {
        if !self.is_open() {
            return false;
        }
        let kind = frame.kind();
        let attempt = async {
            let mut guard = self.writer.lock().await;
            if !self.is_open() {
                return None;
            }
            let writer = guard.as_mut()?;
            Some(match frame {
                Outgoing::Text(text) => writer.write_text(text).await,
                Outgoing::Ping => writer.write_ping().await,
            })
        };

        match timeout(self.write_timeout, attempt).await {
            Ok(None) => false,
            Ok(Some(Ok(()))) => true,
            Ok(Some(Err(e))) => {
                tracing::debug!(conn_id = %self.id, kind, error = %e, "write failed, closing connection");
                self.begin_close();
                false
            }
            Err(_) => {
                tracing::warn!(
                    conn_id = %self.id,
                    kind,
                    timeout_ms = u64::try_from(self.write_timeout.as_millis()).unwrap_or(u64::MAX),
                    "write timed out, closing connection"
                );
                self.begin_close();
                false
            }
        }
    }

    /// Open -> Closing. Wakes the receive loop. Returns false if already past Open.
    pub fn begin_close(&self) -> bool {
        let moved = self
            .state
            .compare_exchange(
                ConnectionState::Open as u8,
                ConnectionState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if moved {
            self.closing.notify_one();
        }
        moved
    }

    /// Release the transport. Idempotent; safe while the receive loop is
    /// still parked on a read (it observes Closing and exits).
    ///
    /// Closing is signalled before touching the writer. If an in-flight write
    /// holds the lock past `write_timeout`, the close frame is skipped and the
    /// writer is dropped with the connection.
    pub async fn dispose(&self) {
        self.begin_close();

        let writer = match timeout(self.write_timeout, self.writer.lock()).await {
            Ok(mut guard) => guard.take(),
            Err(_) => {
                tracing::warn!(conn_id = %self.id, "writer busy past write timeout, skipping close frame");
                self.state.store(ConnectionState::Closed as u8, Ordering::Release);
                return;
            }
        };
        if let Some(mut writer) = writer {
            match timeout(self.write_timeout, writer.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!(conn_id = %self.id, error = %e, "close frame not delivered");
                }
                Err(_) => tracing::debug!(conn_id = %self.id, "close frame timed out"),
            }
            self.state.store(ConnectionState::Closed as u8, Ordering::Release);
        }
    }

    /// Read frames until the channel ends, handing each completed message to `consumer`.
    ///
    /// Reads never assume one read is one message: bytes accumulate until the
    /// transport flags end-of-message. The loop also drives the heartbeat and
    /// the idle timeout. On exit the connection is at least Closing.
    pub async fn receive_loop<R>(
        &self,
        reader: &mut R,
        settings: &LoopSettings,
        consumer: &mpsc::Sender<String>,
    ) -> LoopExit
    where
        R: FrameReader + ?Sized,
    {
        let mut buf = vec![0u8; settings.read_buffer_bytes.max(1)];
        let mut acc = FrameAccumulator::new();
        let mut last_activity = Instant::now();

        let mut ping_tick =
            tokio::time::interval_at(Instant::now() + settings.ping_interval, settings.ping_interval);
        ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let exit = loop {
            if !self.is_open() {
                break LoopExit::LocalClose;
            }

            tokio::select! {
                _ = self.closing.notified() => break LoopExit::LocalClose,

                read = reader.read_frame(&mut buf) => {
                    match read {
                        Ok(ReadResult::Data { count, end_of_message }) => {
                            last_activity = Instant::now();
                            acc.push(&buf[..count.min(buf.len())]);
                            if !end_of_message {
                                continue;
                            }
                            match acc.finish() {
                                Ok(text) => {
                                    if consumer.send(text).await.is_err() {
                                        break LoopExit::ConsumerGone;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!(conn_id = %self.id, error = %e, "dropping undecodable message");
                                }
                            }
                        }
                        Ok(ReadResult::Control) => {
                            last_activity = Instant::now();
                        }
                        Ok(ReadResult::Closed) => break LoopExit::PeerClosed,
                        Err(e) => {
                            tracing::debug!(conn_id = %self.id, error = %e, "read failed");
                            break LoopExit::TransportError;
                        }
                    }
                }

                _ = ping_tick.tick() => {
                    self.ping().await;
                }

                _ = tokio::time::sleep_until(last_activity + settings.idle_timeout) => {
                    break LoopExit::IdleTimeout;
                }
            }
        };

        self.begin_close();
        exit
    }
}

enum Outgoing {
    Text(String),
    Ping,
}

impl Outgoing {
    fn kind(&self) -> &'static str {
        match self {
            Outgoing::Text(_) => "text",
            Outgoing::Ping => "ping",
        }
    }
}
