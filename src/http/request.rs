//! Request identification.
//!
//! # Responsibilities
//! - Name the correlation header shared by every layer
//! - Read the request ID assigned by `SetRequestIdLayer`
//! - Read the path parameters bound by the gateway's router
//!
//! # Design Decisions
//! - A client-supplied `x-request-id` is kept, otherwise a UUID is generated
//! - The same ID is echoed on the response and forwarded upstream

use axum::http::{HeaderName, Request};

use crate::routing::PathParams;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request's correlation ID, or `"unknown"` before the ID layer has run.
pub fn request_id<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Parameters bound by the matched route's `{name}` segments.
pub fn path_params<B>(req: &Request<B>) -> Option<&PathParams> {
    req.extensions().get::<PathParams>()
}
