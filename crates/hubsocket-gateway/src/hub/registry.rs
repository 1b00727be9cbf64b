use std::sync::Arc;

use hubsocket_core::error::{HubSocketError, Result};

use crate::hub::{Hub, HubDescriptor};

/// Hubs probed for every inbound call, in registration order.
#[derive(Default)]
pub struct HubRegistry {
    hubs: Vec<Arc<HubDescriptor>>,
}

impl HubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H: Hub + Default>(&mut self) -> Result<&mut Self> {
        self.register_with(H::default)
    }

    /// Register `H` with a custom constructor (e.g. one capturing shared state).
    pub fn register_with<H, C>(&mut self, constructor: C) -> Result<&mut Self>
    where
        H: Hub,
        C: Fn() -> H + Send + Sync + 'static,
    {
        if self.hubs.iter().any(|h| h.name() == H::NAME) {
            return Err(HubSocketError::Internal(format!("hub {} registered twice", H::NAME)));
        }
        let descriptor = HubDescriptor::build::<H, C>(constructor)?;
        tracing::debug!(hub = H::NAME, methods = ?descriptor.method_names(), "hub registered");
        self.hubs.push(Arc::new(descriptor));
        Ok(self)
    }

    pub fn hubs(&self) -> &[Arc<HubDescriptor>] {
        &self.hubs
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.hubs.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }
}
