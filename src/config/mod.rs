//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), CLI flags or code
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (normalise, reject missing config)
//!     → HostConfig (immutable snapshot owned by the host)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the host is built
//! - All fields have defaults to allow minimal configs
//! - A missing config falls back to defaults; it is never fatal

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{HostConfig, DEFAULT_PORT};
pub use validation::validate_config;
