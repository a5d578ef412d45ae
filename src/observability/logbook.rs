//! Named logger levels, adjustable at runtime.
//!
//! Every logger name maps onto one `EnvFilter` directive: `DEFAULT` is the
//! default directive, any other name is a target prefix (`metricer`,
//! `my_app::db`, ...). When a reload handle is attached, every change
//! rebuilds the filter of the live subscriber.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Name of the logger controlling the default directive.
pub const DEFAULT_LOGGER: &str = "DEFAULT";

/// Handle used to swap the filter of an installed subscriber.
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Logger verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Verbose,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Verbose,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Verbose => "verbose",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Most verbose tracing level let through at this level.
    ///
    /// `tracing` has nothing above `ERROR`, so `Fatal` silences the logger.
    pub fn as_filter(&self) -> LevelFilter {
        match self {
            Level::Verbose => LevelFilter::TRACE,
            Level::Info => LevelFilter::INFO,
            Level::Warning => LevelFilter::WARN,
            Level::Error => LevelFilter::ERROR,
            Level::Fatal => LevelFilter::OFF,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown level name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown logger level: {0}")]
pub struct LevelParseError(pub String);

impl FromStr for Level {
    type Err = LevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| LevelParseError(s.to_string()))
    }
}

/// Error type for logbook operations.
#[derive(Debug, Error)]
pub enum LogbookError {
    #[error("logger does not exist: {0}")]
    UnknownLogger(String),
    #[error("invalid filter directives: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to reload filter: {0}")]
    Reload(#[from] reload::Error),
}

/// Registry of named loggers and their current level.
pub struct Logbook {
    levels: RwLock<BTreeMap<String, Level>>,
    filter: Option<FilterHandle>,
}

impl Logbook {
    /// Create a logbook holding only the `DEFAULT` logger at `Info`.
    pub fn new() -> Self {
        Self::with_default_level(Level::Info)
    }

    /// Create a logbook holding only the `DEFAULT` logger at `level`.
    pub fn with_default_level(level: Level) -> Self {
        let mut levels = BTreeMap::new();
        levels.insert(DEFAULT_LOGGER.to_string(), level);
        Self {
            levels: RwLock::new(levels),
            filter: None,
        }
    }

    /// Attach the reload handle of an installed subscriber.
    pub fn with_filter_handle(mut self, handle: FilterHandle) -> Self {
        self.filter = Some(handle);
        self
    }

    /// Register a logger, inheriting the current `DEFAULT` level.
    ///
    /// Joining an existing logger keeps its level.
    pub fn join(&self, name: &str) {
        let mut levels = self.levels.write();
        if levels.contains_key(name) {
            return;
        }

        let level = levels
            .get(DEFAULT_LOGGER)
            .copied()
            .unwrap_or(Level::Info);
        let mut next = levels.clone();
        next.insert(name.to_string(), level);

        match self.apply(&next) {
            Ok(()) => *levels = next,
            Err(e) => tracing::warn!(logger = %name, error = %e, "Failed to register logger"),
        }
    }

    /// Snapshot of every logger and its level.
    pub fn levels(&self) -> BTreeMap<String, Level> {
        self.levels.read().clone()
    }

    pub fn level(&self, name: &str) -> Option<Level> {
        self.levels.read().get(name).copied()
    }

    /// Change the level of an existing logger.
    pub fn set_level(&self, name: &str, level: Level) -> Result<(), LogbookError> {
        let mut levels = self.levels.write();
        if !levels.contains_key(name) {
            return Err(LogbookError::UnknownLogger(name.to_string()));
        }

        let mut next = levels.clone();
        next.insert(name.to_string(), level);
        self.apply(&next)?;
        *levels = next;

        Ok(())
    }

    /// `EnvFilter` directives for the current levels.
    pub fn directives(&self) -> String {
        build_directives(&self.levels.read())
    }

    fn apply(&self, levels: &BTreeMap<String, Level>) -> Result<(), LogbookError> {
        let Some(handle) = self.filter.as_ref() else {
            return Ok(());
        };

        let filter = EnvFilter::try_new(build_directives(levels))?;
        handle.reload(filter)?;
        Ok(())
    }
}

impl Default for Logbook {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logbook")
            .field("levels", &*self.levels.read())
            .field("reloadable", &self.filter.is_some())
            .finish()
    }
}

fn build_directives(levels: &BTreeMap<String, Level>) -> String {
    let mut directives = Vec::with_capacity(levels.len());
    if let Some(level) = levels.get(DEFAULT_LOGGER) {
        directives.push(level.as_filter().to_string());
    }
    for (name, level) in levels {
        if name != DEFAULT_LOGGER {
            directives.push(format!("{}={}", name, level.as_filter()));
        }
    }
    directives.join(",")
}
