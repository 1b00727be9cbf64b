//! Wire envelope (JSON, lowerCamelCase field names).
//!
//! One shape travels in both directions:
//! - call: `methodName` set, `data` holds the arguments keyed by parameter name
//! - reply: `methodName` null, `data` holds the result, `promiseId` echoed
//! - push: server-initiated, optionally tagged with a `methodName`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HubSocketError, Result};

/// Synthetic call dispatched after a connection is registered.
pub const METHOD_CONNECTED: &str = "OnConnected";
/// Synthetic call dispatched after a connection is removed.
pub const METHOD_DISCONNECTED: &str = "OnDisconnected";
/// Tag of the bootstrap push carrying the peer's own connection id.
pub const METHOD_SOCKET_CONNECTED: &str = "HubSocketConnected";
/// Tag of the push reporting a failed call.
pub const METHOD_ERROR: &str = "Error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Target method on inbound calls; absent on plain replies.
    #[serde(default)]
    pub method_name: Option<String>,
    /// Arguments (calls) or result (replies/pushes).
    #[serde(default)]
    pub data: Value,
    /// Caller-chosen correlation token, copied onto the reply.
    #[serde(default)]
    pub promise_id: Option<Value>,
}

impl Envelope {
    pub fn call(method_name: impl Into<String>, data: Value, promise_id: Option<Value>) -> Self {
        Self {
            method_name: Some(method_name.into()),
            data,
            promise_id,
        }
    }

    /// Reply to a call: no method name, same promise id.
    pub fn reply(data: Value, promise_id: Option<Value>) -> Self {
        Self {
            method_name: None,
            data,
            promise_id,
        }
    }

    pub fn push(method_name: Option<String>, data: Value) -> Self {
        Self {
            method_name,
            data,
            promise_id: None,
        }
    }

    /// Synthetic lifecycle call (`OnConnected` / `OnDisconnected`), no data.
    pub fn lifecycle(method_name: &str) -> Self {
        Self::call(method_name, Value::Null, None)
    }

    /// First message a peer receives: its own connection id.
    pub fn bootstrap(connection_id: &str) -> Self {
        Self::push(
            Some(METHOD_SOCKET_CONNECTED.to_string()),
            Value::String(connection_id.to_string()),
        )
    }

    /// Error push scoped to the call that failed.
    pub fn error(err: &HubSocketError, hub: &str, method: &str, promise_id: Option<Value>) -> Self {
        Self {
            method_name: Some(METHOD_ERROR.to_string()),
            data: serde_json::json!({
                "code": err.client_code().as_str(),
                "message": err.to_string(),
                "hub": hub,
                "method": method,
            }),
            promise_id,
        }
    }

    pub fn is_call(&self) -> bool {
        self.method_name.is_some()
    }

    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| HubSocketError::BadRequest(format!("invalid envelope json: {e}")))
    }

    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| HubSocketError::Internal(format!("envelope encode failed: {e}")))
    }
}
