use serde::Deserialize;
use hubsocket_core::error::{HubSocketError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub connection: ConnectionSection,

    #[serde(default)]
    pub dispatch: DispatchSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(HubSocketError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.connection.validate()?;
        self.dispatch.validate()?;

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            connection: ConnectionSection::default(),
            dispatch: DispatchSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Time between flipping /readyz to 503 and stopping the listener.
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            drain_grace_ms: default_drain_grace_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=120000).contains(&self.ping_interval_ms) {
            return Err(HubSocketError::BadRequest(
                "gateway.ping_interval_ms must be between 1000 and 120000".into(),
            ));
        }
        if !(2000..=600000).contains(&self.idle_timeout_ms) {
            return Err(HubSocketError::BadRequest(
                "gateway.idle_timeout_ms must be between 2000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(HubSocketError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if self.drain_grace_ms > 30000 {
            return Err(HubSocketError::BadRequest(
                "gateway.drain_grace_ms must be at most 30000".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_drain_grace_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    /// Size of the per-read buffer; messages larger than this arrive in several reads.
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,

    /// Completed messages waiting for the connection's dispatch worker.
    #[serde(default = "default_inbound_queue")]
    pub inbound_queue: usize,

    /// Bound on one transport write (reply, push, ping, close frame). A peer
    /// that stops reading is closed once a write exceeds it.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            read_buffer_bytes: default_read_buffer_bytes(),
            inbound_queue: default_inbound_queue(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl ConnectionSection {
    pub fn validate(&self) -> Result<()> {
        if !(16..=1_048_576).contains(&self.read_buffer_bytes) {
            return Err(HubSocketError::BadRequest(
                "connection.read_buffer_bytes must be between 16 and 1048576".into(),
            ));
        }
        if !(1..=65536).contains(&self.inbound_queue) {
            return Err(HubSocketError::BadRequest(
                "connection.inbound_queue must be between 1 and 65536".into(),
            ));
        }
        if !(10..=60000).contains(&self.write_timeout_ms) {
            return Err(HubSocketError::BadRequest(
                "connection.write_timeout_ms must be between 10 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_read_buffer_bytes() -> usize {
    16 * 1024
}
fn default_inbound_queue() -> usize {
    64
}
fn default_write_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    /// Upper bound on a single hub method invocation.
    #[serde(default = "default_hub_call_timeout_ms")]
    pub hub_call_timeout_ms: u64,

    /// Per-connection bound when pushing to all connections.
    #[serde(default = "default_broadcast_send_timeout_ms")]
    pub broadcast_send_timeout_ms: u64,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            hub_call_timeout_ms: default_hub_call_timeout_ms(),
            broadcast_send_timeout_ms: default_broadcast_send_timeout_ms(),
        }
    }
}

impl DispatchSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=600000).contains(&self.hub_call_timeout_ms) {
            return Err(HubSocketError::BadRequest(
                "dispatch.hub_call_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        if !(10..=60000).contains(&self.broadcast_send_timeout_ms) {
            return Err(HubSocketError::BadRequest(
                "dispatch.broadcast_send_timeout_ms must be between 10 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_hub_call_timeout_ms() -> u64 {
    30000
}
fn default_broadcast_send_timeout_ms() -> u64 {
    1500
}
