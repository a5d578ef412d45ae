//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields)
//!
//! logging.rs installs the subscriber:
//!     registry → reload(EnvFilter) → fmt
//!
//! logbook.rs owns logger levels:
//!     GET/PATCH /debug/logger/levels
//!     → Logbook::set_level
//!     → EnvFilter rebuilt and swapped through the reload handle
//! ```

pub mod logbook;
pub mod logging;

pub use logbook::{Level, LevelParseError, Logbook, LogbookError, DEFAULT_LOGGER};
pub use logging::init_logging;
