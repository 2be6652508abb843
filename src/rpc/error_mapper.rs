//! Failure → HTTP response mapping shared by every domain's routes.
//!
//! | kind                 | status |
//! |----------------------|--------|
//! | validation           | 400    |
//! | not found            | 404    |
//! | rate limited         | 429    |
//! | upstream unavailable | 502    |
//! | internal             | 500    |

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use serde_json::json;

use crate::http::response::{json_response, INTERNAL_ERROR_MESSAGE};
use crate::rpc::failure::{Failure, FailureKind};

/// Status code for a failure kind.
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Validation => StatusCode::BAD_REQUEST,
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        FailureKind::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a domain failure into a JSON error response.
///
/// The body always carries `message`. Internal failures are logged and
/// replaced with a generic message.
pub fn map_error_to_response(failure: &Failure) -> Response {
    let status = status_for(failure.kind());

    let body = match failure.kind() {
        FailureKind::Internal => {
            tracing::error!(error = %failure, "Internal handler failure");
            json!({ "message": INTERNAL_ERROR_MESSAGE })
        }
        FailureKind::Validation if !failure.violations().is_empty() => json!({
            "message": failure.message(),
            "violations": failure.violations(),
        }),
        _ => json!({ "message": failure.message() }),
    };

    let mut response = json_response(status, &body);
    if let Some(retry_after) = failure.retry_after() {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after.as_secs()));
    }
    response
}
