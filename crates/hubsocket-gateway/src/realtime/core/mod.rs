//! Realtime core components for the gateway runtime.
//!
//! The connection (framing + send lock), the shared connection registry, and
//! the outbound push proxy handed to hubs.

mod clients;
mod connection;
mod registry;

pub use clients::ClientProxy;
pub use connection::{Connection, LoopSettings};
pub use registry::ConnectionRegistry;
