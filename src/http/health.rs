//! `GET /health/check`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::health::HealthCheck;
use crate::host::HostInner;
use crate::http::response::{error_response, json_response, RequestInfo, MSG_METHOD_NOT_ALLOWED};
use crate::http::server::AppState;
use crate::metrics::Metric;

/// Aggregated outcome of one health check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthReport {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            metric: None,
            message: None,
        }
    }

    pub fn failed(metric: &str, message: String) -> Self {
        Self {
            status: "failed",
            metric: Some(metric.to_string()),
            message: Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.metric.is_none()
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        let status = if self.is_ok() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        json_response(status, &self)
    }
}

pub(crate) async fn health_check(State(host): State<AppState>, request: Request) -> Response {
    let guard = host.inflight.track();
    let info = RequestInfo::from_request(&request);

    if request.method() != Method::GET {
        return error_response(&info, StatusCode::METHOD_NOT_ALLOWED, MSG_METHOD_NOT_ALLOWED);
    }

    tracing::debug!(remote = %info.remote, "Health check request");

    let checks = host.registry.health_checks();
    let worker = Arc::clone(&host);

    // callbacks are arbitrary blocking user code
    let outcome = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        run_health_checks(&worker, &checks)
    })
    .await;

    match outcome {
        Ok(report) => report.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check worker failed");
            error_response(&info, StatusCode::INTERNAL_SERVER_ERROR, "Health check failed to run")
        }
    }
}

/// Run `checks` in order, stopping at the first failure.
pub(crate) fn run_health_checks(host: &HostInner, checks: &[Arc<HealthCheck>]) -> HealthReport {
    for check in checks {
        let Err(err) = check.check() else {
            continue;
        };

        if err.is_panic() {
            tracing::error!(metric = %check.name(), "Panic in healthchecker callback");
        }
        host.failed_health_checks.inc(1);

        tracing::warn!(metric = %check.name(), reason = %err, "Health check failed");

        return HealthReport::failed(check.name(), err.to_string());
    }

    HealthReport::ok()
}
