use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hubsocket_core::error::{HubSocketError, Result};

/// Server-generated connection handle; also the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for ConnectionId {
    type Err = HubSocketError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| HubSocketError::BadRequest(format!("invalid connection id '{s}': {e}")))
    }
}

/// Connection lifecycle: Open -> Closing -> Closed, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Open = 0,
    Closing = 1,
    Closed = 2,
}

impl ConnectionState {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => ConnectionState::Open,
            1 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

/// Why a receive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    PeerClosed,
    TransportError,
    IdleTimeout,
    /// Closed locally: disposal or a failed write.
    LocalClose,
    /// The dispatch worker went away.
    ConsumerGone,
}

impl LoopExit {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopExit::PeerClosed => "peer_closed",
            LoopExit::TransportError => "transport_error",
            LoopExit::IdleTimeout => "idle_timeout",
            LoopExit::LocalClose => "local_close",
            LoopExit::ConsumerGone => "consumer_gone",
        }
    }
}
