//! Hub declaration and lookup.
//!
//! Hubs register their callable methods once at startup into a table keyed by
//! lowercased method name; resolving an inbound call is a map lookup.

pub mod context;
pub mod descriptor;
pub mod factory;
pub mod registry;

pub use context::HubContext;
pub use descriptor::{Args, Hub, HubDescriptor, HubFuture, HubInstance, MethodEntry, MethodTable, ParamDescriptor};
pub use factory::{ConstructorFactory, HubFactory};
pub use registry::HubRegistry;
