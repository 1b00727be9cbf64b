//! Dispatcher module exports.
//!
//! Re-exports the dispatcher and its outcome type so downstream consumers can
//! depend on this module directly.

pub mod dispatcher;

pub use dispatcher::{DispatchOutcome, Dispatcher};
