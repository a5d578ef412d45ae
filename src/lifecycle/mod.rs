//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (startup.rs):
//!     Host::start → spawn ServeTask → bind first free port → ready signal → serve
//!
//! Shutdown (shutdown.rs, inflight.rs):
//!     Host::stop → trigger → graceful drain (bounded) → wait in-flight handlers
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → demo binary stops the host
//! ```
//!
//! # States
//! ```text
//! Idle → Starting → Listening → Stopping → Stopped
//! ```
//!
//! # Design Decisions
//! - Start is a handshake: the caller waits for exactly one readiness signal
//! - Shutdown has a deadline, in-flight handlers are always waited for

pub mod inflight;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use inflight::{InFlight, InFlightGuard};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::shutdown_signal;
pub use startup::{BindPlan, BIND_ATTEMPTS};
