//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Application code
//!     → Host::new_health_check (register callback)
//!
//! GET /health/check:
//!     Snapshot registered checks
//!     → check.rs (invoke callback, contain panics)
//!     → first failure stops the run, reported as 503
//! ```
//!
//! # Design Decisions
//! - Fail fast: checks run in registration order, first failure wins
//! - Callback panics are a failure, never a crash

pub mod check;

pub use check::{BoxError, CheckError, Checker, HealthCheck};
