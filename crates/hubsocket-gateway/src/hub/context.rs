use crate::realtime::{ClientProxy, ConnectionId};

/// Per-call context handed to every hub method.
#[derive(Clone)]
pub struct HubContext {
    connection_id: ConnectionId,
    clients: ClientProxy,
}

impl HubContext {
    pub fn new(connection_id: ConnectionId, clients: ClientProxy) -> Self {
        Self {
            connection_id,
            clients,
        }
    }

    /// The connection the call arrived on.
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn clients(&self) -> &ClientProxy {
        &self.clients
    }
}
