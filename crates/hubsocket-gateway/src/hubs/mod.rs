//! Built-in hubs shipped with the gateway binary.

mod chat;
mod counter;
mod echo;

pub use chat::ChatHub;
pub use counter::CounterHub;
pub use echo::EchoHub;

use hubsocket_core::error::Result;

use crate::hub::HubRegistry;

/// Register every built-in hub.
pub fn register_builtin(registry: &mut HubRegistry) -> Result<()> {
    registry.register::<EchoHub>()?;
    registry.register::<ChatHub>()?;
    let counter = CounterHub::shared();
    registry.register_with(move || counter.clone())?;
    Ok(())
}
