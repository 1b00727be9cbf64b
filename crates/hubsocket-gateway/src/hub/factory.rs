use hubsocket_core::error::Result;

use crate::hub::{HubDescriptor, HubInstance};

/// Produces a ready-to-use hub instance for each call.
///
/// Swap this out to plug in an external container; the dispatcher only ever
/// asks for instances.
pub trait HubFactory: Send + Sync {
    fn create(&self, hub: &HubDescriptor) -> Result<HubInstance>;
}

/// Uses the constructor each hub was registered with.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstructorFactory;

impl HubFactory for ConstructorFactory {
    fn create(&self, hub: &HubDescriptor) -> Result<HubInstance> {
        Ok(hub.construct())
    }
}
