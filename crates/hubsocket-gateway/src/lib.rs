//! hubSocket gateway library entry.
//!
//! Wires transport, connection registry, hub table, dispatcher and push proxy
//! into a gateway stack. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod hub;
pub mod hubs;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod transport;
