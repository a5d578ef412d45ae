//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Mount debug routes only when enabled
//! - Wire up middleware (tracing)
//! - Answer unknown routes with the error envelope

use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::host::HostInner;
use crate::http::response::{method_not_allowed, not_found};
use crate::http::{debug, health, metrics};

pub const PATH_HEALTH_CHECK: &str = "/health/check";
pub const PATH_METRICS_VALUES: &str = "/metrics/values";
pub const PATH_DEBUG_PPROF: &str = "/debug/pprof/";
pub const PATH_DEBUG_PPROF_CMDLINE: &str = "/debug/pprof/cmdline";
pub const PATH_DEBUG_LOGGER_LEVELS: &str = "/debug/logger/levels";

/// Application state injected into handlers.
pub(crate) type AppState = Arc<HostInner>;

/// Build the Axum router with all middleware layers.
pub(crate) fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route(PATH_HEALTH_CHECK, any(health::health_check))
        .route(PATH_METRICS_VALUES, any(metrics::metrics_values));

    if state.config.enable_debug {
        router = router
            .route(PATH_DEBUG_LOGGER_LEVELS, any(debug::logger_levels))
            .route(
                PATH_DEBUG_PPROF,
                get(debug::pprof_index).fallback(method_not_allowed),
            )
            .route(
                PATH_DEBUG_PPROF_CMDLINE,
                get(debug::pprof_cmdline).fallback(method_not_allowed),
            );
    }

    router
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
