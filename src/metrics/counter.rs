//! Counter metric.

use std::sync::atomic::{AtomicI64, Ordering};

use super::Metric;

/// Signed counter adjusted by arbitrary deltas.
///
/// Arithmetic wraps on overflow, matching the native atomic behaviour.
#[derive(Debug)]
pub struct Counter {
    name: String,
    help: String,
    value: AtomicI64,
}

impl Counter {
    /// Create a counter starting at zero.
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            value: AtomicI64::new(0),
        }
    }

    /// Set the value back to zero.
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }

    /// Add `delta` to the value.
    pub fn inc(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Subtract `delta` from the value.
    pub fn dec(&self, delta: i64) {
        self.value.fetch_sub(delta, Ordering::Relaxed);
    }

    /// Current value.
    pub fn count(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Metric for Counter {
    fn name(&self) -> &str {
        &self.name
    }

    fn help(&self) -> &str {
        &self.help
    }
}
