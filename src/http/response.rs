//! Response construction and header merging.
//!
//! # Responsibilities
//! - Build the JSON bodies synthesized by the gateway itself
//! - Build the empty preflight response
//! - Merge CORS headers into handler responses
//!
//! # Design Decisions
//! - Synthesized errors always use `Content-Type: application/json`
//! - Merging never touches the handler's status or body
//! - Merge is last-write-wins: a CORS header replaces a handler header of
//!   the same name. `Vary` is the exception, its values are combined.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Body message used whenever an internal error must not be disclosed.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// JSON response with the given status.
pub fn json_response(status: StatusCode, body: &serde_json::Value) -> Response {
    (status, Json(body)).into_response()
}

/// `{ "error": message }` with the given status.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    json_response(status, &json!({ "error": message }))
}

/// Generic 500 used when a handler failure escapes to the entry point.
pub fn internal_error_response() -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &json!({ "message": INTERNAL_ERROR_MESSAGE }),
    )
}

/// Empty 204 carrying only the given headers.
pub fn preflight_response(cors: &HeaderMap) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    *response.headers_mut() = cors.clone();
    response
}

/// Insert `extra` into a response the gateway synthesized itself.
pub fn with_headers(mut response: Response, extra: &HeaderMap) -> Response {
    for (name, value) in extra {
        response.headers_mut().insert(name.clone(), value.clone());
    }
    response
}

/// Rebuild `response` with the CORS headers merged in.
///
/// Status, version, extensions and body are carried over verbatim.
pub fn merge_cors_headers(response: Response, cors: &HeaderMap) -> Response {
    let (mut parts, body) = response.into_parts();

    for (name, value) in cors {
        if name == header::VARY {
            merge_vary(&mut parts.headers, value);
        } else {
            parts.headers.insert(name.clone(), value.clone());
        }
    }

    Response::from_parts(parts, body)
}

fn merge_vary(headers: &mut HeaderMap, value: &HeaderValue) {
    let mut combined: Vec<String> = headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();

    let Ok(added) = value.to_str() else {
        headers.insert(header::VARY, value.clone());
        return;
    };

    for token in added.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !combined.iter().any(|e| e.eq_ignore_ascii_case(token)) {
            combined.push(token.to_string());
        }
    }

    match HeaderValue::from_str(&combined.join(", ")) {
        Ok(merged) => {
            headers.insert(header::VARY, merged);
        }
        Err(_) => {
            headers.insert(header::VARY, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn cors() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://worldmonitor.app"),
        );
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        headers
    }

    #[tokio::test]
    async fn test_merge_preserves_status_and_body() {
        let handler = (StatusCode::ACCEPTED, "payload").into_response();
        let merged = merge_cors_headers(handler, &cors());

        assert_eq!(merged.status(), StatusCode::ACCEPTED);
        assert_eq!(
            merged.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://worldmonitor.app"
        );
        let body = to_bytes(merged.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"payload");
    }

    #[test]
    fn test_merge_is_last_write_wins() {
        let mut handler = Response::new(Body::empty());
        handler.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://other.example"),
        );
        handler
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=60"));

        let merged = merge_cors_headers(handler, &cors());
        assert_eq!(
            merged.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://worldmonitor.app"
        );
        assert_eq!(merged.headers().get(header::CACHE_CONTROL).unwrap(), "max-age=60");
    }

    #[test]
    fn test_merge_combines_vary() {
        let mut handler = Response::new(Body::empty());
        handler
            .headers_mut()
            .insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));

        let merged = merge_cors_headers(handler, &cors());
        assert_eq!(merged.headers().get(header::VARY).unwrap(), "Accept-Encoding, Origin");

        let again = merge_cors_headers(merged, &cors());
        assert_eq!(again.headers().get(header::VARY).unwrap(), "Accept-Encoding, Origin");
    }

    #[tokio::test]
    async fn test_preflight_is_empty_204() {
        let response = preflight_response(&cors());
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_json_error_shape() {
        let response = json_error(StatusCode::NOT_FOUND, "Not found");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Not found");
    }
}
