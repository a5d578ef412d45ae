//! Metric primitives.
//!
//! # Kinds
//! - `Counter` (counter.rs): signed value adjusted by deltas, resettable
//! - `Gauge` (gauge.rs): signed value overwritten on every update
//! - `Label` (label.rs): string value, rendered as a shared attribute
//!
//! # Design Decisions
//! - Every mutation is a single atomic operation, no locks on hot paths
//! - Name and help are fixed at construction and readable without synchronization
//! - Handles are shared via `Arc`; the host keeps one copy, the caller the other

pub mod counter;
pub mod gauge;
pub mod label;

use std::sync::Arc;

pub use counter::Counter;
pub use gauge::Gauge;
pub use label::Label;

/// Common accessors of every named, help-documented observable.
pub trait Metric {
    /// Metric name, as exposed over HTTP.
    fn name(&self) -> &str;

    /// Human readable description.
    fn help(&self) -> &str;
}

/// A registered metric of one of the supported kinds.
#[derive(Debug, Clone)]
pub enum MetricHandle {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    Label(Arc<Label>),
}

impl MetricHandle {
    /// Exposition type name, `None` for labels which are not rendered as samples.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            MetricHandle::Counter(_) => Some("counter"),
            MetricHandle::Gauge(_) => Some("gauge"),
            MetricHandle::Label(_) => None,
        }
    }
}

impl Metric for MetricHandle {
    fn name(&self) -> &str {
        match self {
            MetricHandle::Counter(m) => m.name(),
            MetricHandle::Gauge(m) => m.name(),
            MetricHandle::Label(m) => m.name(),
        }
    }

    fn help(&self) -> &str {
        match self {
            MetricHandle::Counter(m) => m.help(),
            MetricHandle::Gauge(m) => m.help(),
            MetricHandle::Label(m) => m.help(),
        }
    }
}

impl From<Arc<Counter>> for MetricHandle {
    fn from(metric: Arc<Counter>) -> Self {
        MetricHandle::Counter(metric)
    }
}

impl From<Arc<Gauge>> for MetricHandle {
    fn from(metric: Arc<Gauge>) -> Self {
        MetricHandle::Gauge(metric)
    }
}

impl From<Arc<Label>> for MetricHandle {
    fn from(metric: Arc<Label>) -> Self {
        MetricHandle::Label(metric)
    }
}
