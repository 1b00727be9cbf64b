//! Top-level facade crate for hubSocket.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use hubsocket_core::*;
}

pub mod gateway {
    pub use hubsocket_gateway::*;
}
