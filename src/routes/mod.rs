//! HTTP route handlers and shared response plumbing

pub mod analysis;
pub mod feed;
pub mod health;
pub mod rate_limit;
pub mod search;
pub mod validation;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{AtriumError, Result};

/// Serialize a value as a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let payload = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Full::new(Bytes::from(payload)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{}"))))
}

/// JSON error body: `{"error": "..."}`
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }))
}

/// CORS preflight response
pub fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS")
        .header(ACCESS_CONTROL_ALLOW_HEADERS, "Authorization, Content-Type")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// Parse a JSON request body; an empty body deserializes defaulted types
pub fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AtriumError::Validation(format!("Invalid request body: {}", e)))
}

/// Map a handler error onto an HTTP response. Remote-API failures carry
/// their classified user message; internal details stay in the logs.
pub fn error_to_response(error: &AtriumError) -> Response<Full<Bytes>> {
    match error {
        AtriumError::Validation(message) => error_response(StatusCode::BAD_REQUEST, message),
        AtriumError::Auth(message) => error_response(StatusCode::UNAUTHORIZED, message),
        AtriumError::NotFound(message) => error_response(StatusCode::NOT_FOUND, message),
        AtriumError::Database(_) | AtriumError::Config(_) | AtriumError::Io(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        remote => error_response(StatusCode::BAD_GATEWAY, &remote.user_message()),
    }
}
