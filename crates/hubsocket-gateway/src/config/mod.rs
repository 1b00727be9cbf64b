//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use hubsocket_core::error::{HubSocketError, Result};

pub use schema::{ConnectionSection, DispatchSection, GatewayConfig, GatewaySection};

/// Env var overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "HUBSOCKET_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "hubsocket.yaml";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| HubSocketError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| HubSocketError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve the config path from `HUBSOCKET_CONFIG`, falling back to `hubsocket.yaml`.
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
