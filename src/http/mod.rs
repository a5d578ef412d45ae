//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (lifecycle::startup)
//!     → server.rs (Axum router, debug routes when enabled)
//!     → health.rs  GET /health/check
//!     → metrics.rs GET /metrics/values (JSON or OpenMetrics text)
//!     → debug.rs   GET|PATCH /debug/logger/levels, GET /debug/pprof/*
//!     → response.rs (JSON bodies, error envelope)
//! ```
//!
//! # Design Decisions
//! - Handlers check the method themselves so every rejection uses the envelope
//! - Every handler holds an in-flight guard for `Host::stop`

pub mod debug;
pub mod health;
pub mod metrics;
pub mod response;
pub mod server;

pub(crate) use server::build_router;
pub use server::{
    PATH_DEBUG_LOGGER_LEVELS, PATH_DEBUG_PPROF, PATH_DEBUG_PPROF_CMDLINE, PATH_HEALTH_CHECK,
    PATH_METRICS_VALUES,
};
