//! Transport layer (WebSocket).
//!
//! The frame reader/writer seam, its axum adapters, the upgrade handler, and
//! the acceptor that drives each connection's lifecycle.

pub mod acceptor;
pub mod codec;
pub mod frame;
pub mod ws;

pub use acceptor::Acceptor;
pub use frame::{FrameReader, FrameWriter, ReadResult};
