//! Realtime runtime for the hubSocket gateway.
//!
//! Connections, the registry keyed by connection id, and server push.

pub mod core;
pub mod types;

pub use core::{ClientProxy, Connection, ConnectionRegistry, LoopSettings};
pub use types::{ConnectionId, ConnectionState, LoopExit};
