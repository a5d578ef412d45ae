//! In-process telemetry host.
//!
//! Register counters, gauges, labels and health checks on a [`Host`], start
//! it, and scrape them over HTTP:
//!
//! - `GET /health/check`: runs every health check, 200 or 503
//! - `GET /metrics/values`: JSON or OpenMetrics-style text per `Accept`
//! - `/debug/...`: logger levels and process info, when debug is enabled

pub mod config;
pub mod health;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod metrics;
pub mod observability;

pub use config::HostConfig;
pub use health::{BoxError, CheckError, HealthCheck};
pub use host::{Host, HostBuilder, HostError, RuntimeReading, RuntimeStats};
pub use metrics::{Counter, Gauge, Label, Metric, MetricHandle};
pub use observability::{Level, Logbook};
