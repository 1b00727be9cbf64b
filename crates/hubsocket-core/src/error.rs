//! Shared error type across hubSocket crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Call arguments could not be bound to the method's parameters.
    BindingFailed,
    /// The hub method itself failed.
    InvocationFailed,
    /// The hub method did not complete in time.
    Timeout,
    /// Registry lookup/removal for an id that is not registered.
    UnknownConnection,
    /// Socket read/write failure.
    Transport,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON error pushes.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::BindingFailed => "BINDING_FAILED",
            ClientCode::InvocationFailed => "INVOCATION_FAILED",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::UnknownConnection => "UNKNOWN_CONNECTION",
            ClientCode::Transport => "TRANSPORT",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, HubSocketError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum HubSocketError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("binding failed: {0}")]
    Binding(String),
    #[error("invocation failed: {0}")]
    Invocation(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("could not remove connection with id: '{0}'")]
    UnknownConnection(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl HubSocketError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            HubSocketError::BadRequest(_) => ClientCode::BadRequest,
            HubSocketError::Binding(_) => ClientCode::BindingFailed,
            HubSocketError::Invocation(_) => ClientCode::InvocationFailed,
            HubSocketError::Timeout(_) => ClientCode::Timeout,
            HubSocketError::UnknownConnection(_) => ClientCode::UnknownConnection,
            HubSocketError::Transport(_) => ClientCode::Transport,
            HubSocketError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            HubSocketError::Internal(_) => ClientCode::Internal,
        }
    }
}
