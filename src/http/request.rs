//! Request identification.
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (see `HttpServer::build_router`)
//! - The ID is an ordinary header, so the authorization service sees it too

use axum::http::{HeaderMap, HeaderName};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID of a request, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
