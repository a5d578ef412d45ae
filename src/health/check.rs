//! Health check wrapper around a user callback.
//!
//! # Responsibilities
//! - Hold the name and help of a health check
//! - Invoke the user callback on demand
//! - Contain panics raised by the callback
//!
//! # Design Decisions
//! - A panic never crosses `check()`; it becomes `CheckError::CallbackPanic`
//! - A missing callback always reports healthy

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::metrics::Metric;

/// Boxed error returned by health check callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Callback probing some part of the application.
pub type Checker = Box<dyn Fn() -> Result<(), BoxError> + Send + Sync + 'static>;

/// Failure reported by a health check.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The callback returned an error.
    #[error("{0}")]
    Failed(BoxError),
    /// The callback panicked.
    #[error("Panic in health check callback")]
    CallbackPanic,
}

impl CheckError {
    pub fn is_panic(&self) -> bool {
        matches!(self, CheckError::CallbackPanic)
    }
}

/// Named health check.
pub struct HealthCheck {
    name: String,
    help: String,
    checker: Option<Checker>,
}

impl HealthCheck {
    /// Create a health check without a callback. It always succeeds.
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            checker: None,
        }
    }

    /// Attach the callback invoked by `check()`.
    pub fn with_checker<F>(mut self, checker: F) -> Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.checker = Some(Box::new(checker));
        self
    }

    /// Run the callback.
    pub fn check(&self) -> Result<(), CheckError> {
        let Some(checker) = self.checker.as_ref() else {
            return Ok(());
        };

        match panic::catch_unwind(AssertUnwindSafe(|| checker())) {
            Ok(result) => result.map_err(CheckError::Failed),
            Err(_) => Err(CheckError::CallbackPanic),
        }
    }
}

impl Metric for HealthCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn help(&self) -> &str {
        &self.help
    }
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck")
            .field("name", &self.name)
            .field("help", &self.help)
            .field("checker", &self.checker.is_some())
            .finish()
    }
}
