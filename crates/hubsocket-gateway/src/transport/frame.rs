//! Transport seam used by `Connection`.
//!
//! The reader mirrors a classic socket receive: it fills a caller-owned
//! buffer and reports how many bytes were written and whether they complete a
//! message. Anything that can produce such reads (axum WebSocket, an in-memory
//! pipe in tests) can back a connection.

use async_trait::async_trait;

use hubsocket_core::error::Result;

/// Outcome of a single read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResult {
    /// `count` bytes were written to the front of the buffer.
    Data { count: usize, end_of_message: bool },
    /// A control frame (ping/pong) was seen; no payload bytes. Counts as activity.
    Control,
    /// The peer closed the channel or the stream ended.
    Closed,
}

/// Implementations must be cancel safe: the receive loop races each read
/// against the heartbeat, the idle timer and local shutdown.
#[async_trait]
pub trait FrameReader: Send {
    async fn read_frame(&mut self, buf: &mut [u8]) -> Result<ReadResult>;
}

#[async_trait]
pub trait FrameWriter: Send {
    /// Write one complete text message.
    async fn write_text(&mut self, text: String) -> Result<()>;
    async fn write_ping(&mut self) -> Result<()>;
    /// Send a close frame and release the write half.
    async fn close(&mut self) -> Result<()>;
}
