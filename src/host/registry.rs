//! Registry of metrics and health checks.
//!
//! # Design Decisions
//! - Append-only: entries are never removed or reordered
//! - One reader/writer lock, held only to append or to clone the handle list
//! - Duplicate names are accepted; every entry stays visible

use std::sync::Arc;

use parking_lot::RwLock;

use crate::health::HealthCheck;
use crate::metrics::MetricHandle;

#[derive(Debug, Default)]
struct Entries {
    metrics: Vec<MetricHandle>,
    health_checks: Vec<Arc<HealthCheck>>,
}

/// Insertion-ordered collection of registered metrics and health checks.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<Entries>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_metric(&self, metric: impl Into<MetricHandle>) {
        self.entries.write().metrics.push(metric.into());
    }

    pub fn register_health_check(&self, check: Arc<HealthCheck>) {
        self.entries.write().health_checks.push(check);
    }

    /// Snapshot of the registered metrics, in registration order.
    pub fn metrics(&self) -> Vec<MetricHandle> {
        self.entries.read().metrics.clone()
    }

    /// Snapshot of the registered health checks, in registration order.
    pub fn health_checks(&self) -> Vec<Arc<HealthCheck>> {
        self.entries.read().health_checks.clone()
    }
}
