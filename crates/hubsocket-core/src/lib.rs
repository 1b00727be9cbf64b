//! hubSocket core: transport-agnostic protocol primitives and the shared error type.
//!
//! This crate defines the wire envelope exchanged with peers, the partial-frame
//! accumulator used by every connection's receive loop, and the error surface
//! shared by the gateway and hubs. It carries no transport or runtime
//! dependencies so it can be reused by clients and test tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `HubSocketError`/`Result` so a peer
//! sending garbage cannot crash the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ClientCode, HubSocketError, Result};
pub use protocol::{Envelope, FrameAccumulator};
