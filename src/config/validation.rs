//! Configuration validation.
//!
//! # Responsibilities
//! - Reject a missing configuration
//! - Normalise values that have a sensible default (port 0)
//!
//! # Design Decisions
//! - Validation never fails on values: the host always starts with something usable
//! - Runs once, before the config snapshot is taken by the host

use crate::config::loader::ConfigError;
use crate::config::schema::{HostConfig, DEFAULT_PORT};

/// Validate an optional configuration and return the normalised snapshot.
pub fn validate_config(config: Option<HostConfig>) -> Result<HostConfig, ConfigError> {
    let mut config = config.ok_or(ConfigError::Missing)?;

    if config.port == 0 {
        config.port = DEFAULT_PORT;
    }

    Ok(config)
}
