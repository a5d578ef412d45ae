//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Base port the host tries first.
pub const DEFAULT_PORT: u16 = 9110;

/// Root configuration of the metrics host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    /// Bind on all interfaces instead of loopback only.
    #[serde(rename = "external")]
    pub allow_external: bool,

    /// Mount the debug endpoints (`/debug/...`).
    #[serde(rename = "debug")]
    pub enable_debug: bool,

    /// First port of the bind range.
    pub port: u16,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            allow_external: false,
            enable_debug: false,
            port: DEFAULT_PORT,
        }
    }
}
