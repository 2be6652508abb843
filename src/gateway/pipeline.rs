use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
};
use futures_util::FutureExt;

use crate::http::request::request_id;
use crate::http::response::{
    internal_error_response, json_error, merge_cors_headers, preflight_response, with_headers,
};
use crate::observability::metrics::{self, Rejection, UNMATCHED_ROUTE};
use crate::routing::Router;
use crate::security::api_key::{KEY_INVALID_MESSAGE, KEY_REQUIRED_MESSAGE};
use crate::security::{cors_headers_or_wildcard, ApiKeyGuard, OriginPolicy};

pub const ORIGIN_NOT_ALLOWED_MESSAGE: &str = "Origin not allowed";
pub const NOT_FOUND_MESSAGE: &str = "Not found";

/// Single entry point for every gateway request.
pub struct Gateway {
    router: Router,
    origins: Box<dyn OriginPolicy>,
    keys: Box<dyn ApiKeyGuard>,
}

impl Gateway {
    pub fn new(router: Router, origins: Box<dyn OriginPolicy>, keys: Box<dyn ApiKeyGuard>) -> Self {
        tracing::info!(routes = router.len(), "Gateway initialized");
        Self {
            router,
            origins,
            keys,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Run a request through the full pipeline. Never fails: every outcome is a response.
    pub async fn handle(&self, mut req: Request<Body>) -> Response {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let request_id = request_id(&req).to_string();

        if self.origins.is_disallowed_origin(&req) {
            tracing::debug!(request_id = %request_id, path = %path, "Origin rejected");
            metrics::record_rejection(Rejection::OriginNotAllowed);
            let response = json_error(StatusCode::FORBIDDEN, ORIGIN_NOT_ALLOWED_MESSAGE);
            return finish(response, &method, UNMATCHED_ROUTE, start);
        }

        let cors = cors_headers_or_wildcard(self.origins.as_ref(), &req);

        if method == Method::OPTIONS {
            return finish(preflight_response(&cors), &method, UNMATCHED_ROUTE, start);
        }

        let key_check = self.keys.validate_api_key(&req);
        if key_check.is_rejected() {
            let message = key_check.error.as_deref().unwrap_or(KEY_REQUIRED_MESSAGE);
            let reason = if message == KEY_INVALID_MESSAGE {
                Rejection::ApiKeyInvalid
            } else {
                Rejection::ApiKeyMissing
            };
            tracing::debug!(request_id = %request_id, path = %path, reason = reason.as_str(), "API key rejected");
            metrics::record_rejection(reason);
            let response = with_headers(json_error(StatusCode::UNAUTHORIZED, message), &cors);
            return finish(response, &method, UNMATCHED_ROUTE, start);
        }

        let Some(matched) = self.router.match_request(&req) else {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "No route matched");
            metrics::record_rejection(Rejection::NotFound);
            let response = with_headers(json_error(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE), &cors);
            return finish(response, &method, UNMATCHED_ROUTE, start);
        };
        let handler = matched.route.handler().clone();
        let route = matched.route.pattern().as_str().to_string();
        req.extensions_mut().insert(matched.params);

        tracing::debug!(request_id = %request_id, route = %route, "Dispatching");

        let outcome = AssertUnwindSafe(async move { handler(req).await })
            .catch_unwind()
            .await;
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(failure)) => {
                tracing::error!(request_id = %request_id, route = %route, error = %failure, "Unhandled handler failure");
                internal_error_response()
            }
            Err(panic) => {
                tracing::error!(
                    request_id = %request_id,
                    route = %route,
                    panic = panic_message(panic.as_ref()),
                    "Handler panicked"
                );
                internal_error_response()
            }
        };

        finish(merge_cors_headers(response, &cors), &method, &route, start)
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("routes", &self.router.len())
            .finish_non_exhaustive()
    }
}

fn finish(response: Response, method: &Method, route: &str, start: Instant) -> Response {
    metrics::record_request(method.as_str(), response.status().as_u16(), route, start);
    response
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::path_params;
    use crate::routing::{Route, RouteTable};
    use crate::rpc::Failure;
    use crate::security::{KeyCheckResult, PolicyError};
    use axum::body::to_bytes;
    use axum::http::{header, HeaderMap};

    fn test_cors_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, "https://worldmonitor.app".parse().unwrap());
        headers
    }

    struct FixedOrigins {
        reject: bool,
        broken: bool,
    }

    impl OriginPolicy for FixedOrigins {
        fn is_disallowed_origin(&self, _req: &Request<Body>) -> bool {
            self.reject
        }

        fn cors_headers(&self, _req: &Request<Body>) -> Result<HeaderMap, PolicyError> {
            if self.broken {
                return Err(PolicyError::InvalidHeaderValue {
                    field: "origin",
                    value: "\n".into(),
                });
            }
            Ok(test_cors_headers())
        }
    }

    struct FixedKeys(KeyCheckResult);

    impl ApiKeyGuard for FixedKeys {
        fn validate_api_key(&self, _req: &Request<Body>) -> KeyCheckResult {
            self.0.clone()
        }
    }

    fn gateway(reject: bool, broken: bool, keys: KeyCheckResult) -> Gateway {
        let routes = vec![
            Route::new(Method::POST, "/api/seismology/v1/list-earthquakes", |_req| async {
                Ok(Response::new(Body::from(r#"{"earthquakes":[]}"#)))
            })
            .unwrap(),
            Route::new(Method::POST, "/api/news/v1/summarize-article", |_req| async {
                Err(Failure::internal("summarizer offline"))
            })
            .unwrap(),
            Route::new(Method::POST, "/api/intelligence/v1/{rpc}", |req| async move {
                let rpc = path_params(&req).and_then(|p| p.get("rpc")).unwrap_or("").to_string();
                Ok(Response::new(Body::from(rpc)))
            })
            .unwrap(),
        ];
        Gateway::new(
            Router::new(RouteTable::new().with_routes(routes)),
            Box::new(FixedOrigins { reject, broken }),
            Box::new(FixedKeys(keys)),
        )
    }

    fn post(path: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_disallowed_origin_short_circuits() {
        let gw = gateway(true, false, KeyCheckResult::rejected("API key required"));
        let response = gw.handle(post("/api/seismology/v1/list-earthquakes")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(body_json(response).await["error"], ORIGIN_NOT_ALLOWED_MESSAGE);
    }

    #[tokio::test]
    async fn test_broken_policy_falls_back_to_wildcard() {
        let gw = gateway(false, true, KeyCheckResult::not_required());
        let response = gw.handle(post("/api/seismology/v1/list-earthquakes")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }

    #[tokio::test]
    async fn test_preflight_skips_key_check() {
        let gw = gateway(false, false, KeyCheckResult::rejected("API key required"));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/unknown/v1/anything")
            .body(Body::empty())
            .unwrap();
        let response = gw.handle(req).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://worldmonitor.app"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_key_rejection_carries_cors() {
        let gw = gateway(false, false, KeyCheckResult::rejected("Invalid API key"));
        let response = gw.handle(post("/api/seismology/v1/list-earthquakes")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_some());
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(body_json(response).await["error"], "Invalid API key");
    }

    #[tokio::test]
    async fn test_unmatched_route_is_404() {
        let gw = gateway(false, false, KeyCheckResult::accepted());
        let response = gw.handle(post("/api/seismology/v1/list-volcanoes")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_some());
        assert_eq!(body_json(response).await["error"], NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn test_escaped_failure_is_generic_500() {
        let gw = gateway(false, false, KeyCheckResult::accepted());
        let response = gw.handle(post("/api/news/v1/summarize-article")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_some());
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
        assert!(!body.to_string().contains("summarizer"));
    }

    #[tokio::test]
    async fn test_handler_sees_path_params() {
        let gw = gateway(false, false, KeyCheckResult::accepted());
        let response = gw.handle(post("/api/intelligence/v1/get-risk-scores")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"get-risk-scores");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(payload.as_ref()), "kaboom");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
