//! Response helpers shared by all handlers.
//!
//! # Responsibilities
//! - Serialize JSON bodies with an explicit charset
//! - Build the `{"error":{"code","message"}}` envelope for 4xx/5xx answers
//! - Log every rejected request with its origin

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const ACCEPT_JSON: &str = "application/json";
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

pub const MSG_METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const MSG_NOT_FOUND: &str = "Not Found";
pub const MSG_BAD_REQUEST: &str = "Incorrect request format";

/// Request attributes kept for logging after the body has been consumed.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub remote: String,
}

impl RequestInfo {
    pub fn from_request(request: &Request) -> Self {
        let remote = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            method: request.method().clone(),
            path: request.uri().to_string(),
            remote,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: u16,
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

/// Serialize `body` as a JSON response.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)], bytes).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Plain text response.
pub fn text_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, CONTENT_TYPE_TEXT)], body).into_response()
}

/// Error envelope response, logged with the request origin.
pub fn error_response(info: &RequestInfo, status: StatusCode, message: &str) -> Response {
    tracing::warn!(
        status = status.as_u16(),
        remote = %info.remote,
        method = %info.method,
        path = %info.path,
        "{}",
        message
    );

    json_response(
        status,
        &ErrorEnvelope {
            error: ErrorBody {
                code: status.as_u16(),
                message,
            },
        },
    )
}

/// Fallback for methods a route does not accept.
pub async fn method_not_allowed(request: Request) -> Response {
    let info = RequestInfo::from_request(&request);
    error_response(&info, StatusCode::METHOD_NOT_ALLOWED, MSG_METHOD_NOT_ALLOWED)
}

/// Fallback for unknown routes.
pub async fn not_found(request: Request) -> Response {
    let info = RequestInfo::from_request(&request);
    error_response(&info, StatusCode::NOT_FOUND, MSG_NOT_FOUND)
}
