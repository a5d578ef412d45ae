//! Debug endpoints, mounted only when `enable_debug` is set.
//!
//! - `GET|PATCH /debug/logger/levels`: inspect and change logger levels
//! - `GET /debug/pprof/`: index of debug routes
//! - `GET /debug/pprof/cmdline`: process arguments, NUL separated

use std::collections::BTreeMap;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::Response;

use crate::http::response::{
    error_response, json_response, text_response, RequestInfo, MSG_BAD_REQUEST,
    MSG_METHOD_NOT_ALLOWED,
};
use crate::http::server::{
    AppState, PATH_DEBUG_LOGGER_LEVELS, PATH_DEBUG_PPROF, PATH_DEBUG_PPROF_CMDLINE,
};
use crate::observability::Level;

/// Largest accepted PATCH body.
const MAX_PATCH_BODY: usize = 64 * 1024;

pub(crate) async fn logger_levels(State(host): State<AppState>, request: Request) -> Response {
    let _guard = host.inflight.track();
    let info = RequestInfo::from_request(&request);

    let method = request.method().clone();
    match method {
        Method::GET => get_levels(&host, &info),
        Method::PATCH => patch_levels(&host, &info, request).await,
        _ => error_response(&info, StatusCode::METHOD_NOT_ALLOWED, MSG_METHOD_NOT_ALLOWED),
    }
}

fn get_levels(host: &AppState, info: &RequestInfo) -> Response {
    tracing::debug!(remote = %info.remote, "Get logger levels");

    let levels: BTreeMap<String, &'static str> = host
        .logbook
        .levels()
        .into_iter()
        .map(|(name, level)| (name, level.as_str()))
        .collect();

    json_response(StatusCode::OK, &levels)
}

async fn patch_levels(host: &AppState, info: &RequestInfo, request: Request) -> Response {
    tracing::debug!(remote = %info.remote, "Patch logger levels");

    let body = match to_bytes(request.into_body(), MAX_PATCH_BODY).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Reading request body error");
            return error_response(info, StatusCode::BAD_REQUEST, MSG_BAD_REQUEST);
        }
    };

    // `null` is an empty batch
    let parsed: Result<Option<BTreeMap<String, String>>, _> = serde_json::from_slice(&body);
    let requested = match parsed {
        Ok(requested) => requested.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Parsing request body error");
            return error_response(info, StatusCode::BAD_REQUEST, MSG_BAD_REQUEST);
        }
    };

    // first pass: validate the whole batch
    let current = host.logbook.levels();
    let mut changes = Vec::with_capacity(requested.len());
    for (logger, level) in &requested {
        if !current.contains_key(logger) {
            tracing::error!(logger = %logger, "Requested logger does not exist");
            return error_response(info, StatusCode::BAD_REQUEST, MSG_BAD_REQUEST);
        }
        match level.parse::<Level>() {
            Ok(level) => changes.push((logger, level)),
            Err(_) => {
                tracing::error!(logger = %logger, level = %level, "Requested incorrect logger level");
                return error_response(info, StatusCode::BAD_REQUEST, MSG_BAD_REQUEST);
            }
        }
    }

    // second pass: apply
    for (logger, level) in changes {
        if let Err(e) = host.logbook.set_level(logger, level) {
            tracing::warn!(logger = %logger, error = %e, "Failed to set logger level");
        }
    }

    json_response(StatusCode::OK, &serde_json::json!({}))
}

pub(crate) async fn pprof_index() -> Response {
    let body = [
        PATH_DEBUG_PPROF,
        PATH_DEBUG_PPROF_CMDLINE,
        PATH_DEBUG_LOGGER_LEVELS,
    ]
    .iter()
    .map(|path| format!("{}\n", path))
    .collect::<String>();

    text_response(StatusCode::OK, body)
}

pub(crate) async fn pprof_cmdline() -> Response {
    let args = std::env::args().collect::<Vec<_>>().join("\0");
    text_response(StatusCode::OK, args)
}
