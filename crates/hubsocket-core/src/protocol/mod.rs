//! Protocol modules (envelope + framing).
//!
//! - `envelope`: the single JSON message shape used for calls, replies, and pushes.
//! - `frame`: reassembly of transport reads into complete messages.
//!
//! Parsers are panic-free: malformed input is reported as `HubSocketError`
//! instead of panicking, so one bad message never takes a connection down.

pub mod envelope;
pub mod frame;

pub use envelope::{Envelope, METHOD_CONNECTED, METHOD_DISCONNECTED, METHOD_ERROR, METHOD_SOCKET_CONNECTED};
pub use frame::FrameAccumulator;
