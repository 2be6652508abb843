//! Upstream-backed domain service.
//!
//! # Responsibilities
//! - Forward one RPC to `{upstream}/{rpc}` over a pooled HTTP client
//! - Pass successful responses through untouched
//! - Translate upstream failures into `Failure` kinds
//!
//! # Design Decisions
//! - Request body is buffered (bounded) so an oversize body fails before any upstream I/O
//! - The timeout bounds connect, response headers and any error body read;
//!   a successful body streams to the client afterwards
//! - Upstream 5xx bodies are never echoed to clients

use std::time::{Duration, Instant};

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, HeaderName, Method, Request, StatusCode, Uri},
    response::Response,
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::http::X_REQUEST_ID;
use crate::rpc::Failure;
use crate::services::Domain;

/// Upper bound on an upstream error body read for its message.
const ERROR_BODY_LIMIT: usize = 64 * 1024;

pub type UpstreamClient = Client<HttpConnector, Body>;

/// Shared client; cloning shares the connection pool.
pub fn upstream_client() -> UpstreamClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

pub struct UpstreamService {
    domain: Domain,
    base: String,
    client: UpstreamClient,
    timeout: Duration,
    max_body_bytes: usize,
}

impl UpstreamService {
    pub fn new(
        domain: Domain,
        upstream: &str,
        client: UpstreamClient,
        timeout: Duration,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            domain,
            base: upstream.trim_end_matches('/').to_string(),
            client,
            timeout,
            max_body_bytes,
        }
    }

    pub fn rpc_uri(&self, rpc: &str, query: Option<&str>) -> Result<Uri, Failure> {
        let uri = match query {
            Some(q) if !q.is_empty() => format!("{}/{}?{}", self.base, rpc, q),
            _ => format!("{}/{}", self.base, rpc),
        };
        uri.parse::<Uri>()
            .map_err(|e| Failure::internal(format!("invalid upstream URI `{}`: {}", uri, e)))
    }

    /// Forward an RPC request and translate the upstream's answer.
    pub async fn forward(&self, rpc: &str, req: Request<Body>) -> Result<Response, Failure> {
        let start = Instant::now();
        let (parts, body) = req.into_parts();

        let bytes = to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|_| Failure::validation("Request body too large or unreadable"))?;

        let uri = self.rpc_uri(rpc, parts.uri.query())?;
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        for name in forwarded_request_headers() {
            if let Some(value) = parts.headers.get(&name) {
                builder = builder.header(name, value.clone());
            }
        }
        let upstream_req = builder
            .body(Body::from(bytes))
            .map_err(|e| Failure::internal(format!("building upstream request: {}", e)))?;

        let response = match tokio::time::timeout(self.timeout, self.client.request(upstream_req)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(domain = %self.domain, rpc = %rpc, error = %e, "Upstream error");
                return Err(Failure::upstream_unavailable("Upstream request failed"));
            }
            Err(_) => {
                tracing::warn!(
                    domain = %self.domain,
                    rpc = %rpc,
                    timeout = ?self.timeout,
                    "Upstream timed out"
                );
                return Err(Failure::upstream_unavailable("Upstream request timed out"));
            }
        };

        let status = response.status();
        tracing::debug!(
            domain = %self.domain,
            rpc = %rpc,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Upstream responded"
        );

        let (upstream_parts, upstream_body) = response.into_parts();
        if status.is_success() {
            return Ok(pass_through(status, &upstream_parts.headers, upstream_body));
        }

        // Only 4xx bodies carry a message worth reading.
        if !status.is_client_error() {
            return Err(failure_for_status(status, &upstream_parts.headers, None));
        }

        let remaining = self.timeout.saturating_sub(start.elapsed());
        let read = to_bytes(Body::new(upstream_body), ERROR_BODY_LIMIT);
        let message = match tokio::time::timeout(remaining, read).await {
            Ok(Ok(bytes)) => error_message(&bytes),
            Ok(Err(_)) => None,
            Err(_) => {
                tracing::warn!(domain = %self.domain, rpc = %rpc, "Upstream error body timed out");
                None
            }
        };
        Err(failure_for_status(status, &upstream_parts.headers, message))
    }
}

impl std::fmt::Debug for UpstreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamService")
            .field("domain", &self.domain)
            .field("base", &self.base)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Successful upstream response with only the cache-relevant headers kept.
fn pass_through(status: StatusCode, headers: &HeaderMap, body: Incoming) -> Response {
    let mut out = Response::new(Body::new(body));
    *out.status_mut() = status;
    for name in [header::CONTENT_TYPE, header::CACHE_CONTROL] {
        if let Some(value) = headers.get(&name) {
            out.headers_mut().insert(name, value.clone());
        }
    }
    out
}

fn forwarded_request_headers() -> [HeaderName; 4] {
    [
        header::CONTENT_TYPE,
        header::ACCEPT,
        header::ACCEPT_LANGUAGE,
        X_REQUEST_ID,
    ]
}

/// `message` or `error` string field of a JSON error body.
fn error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key)?.as_str())
        .map(String::from)
}

pub(crate) fn failure_for_status(
    status: StatusCode,
    headers: &HeaderMap,
    message: Option<String>,
) -> Failure {
    let describe = |fallback: &str| message.clone().unwrap_or_else(|| fallback.to_string());

    match status {
        StatusCode::NOT_FOUND => Failure::not_found(describe("Not found")),
        StatusCode::TOO_MANY_REQUESTS => {
            let failure = Failure::rate_limited(describe("Too many requests"));
            match retry_after(headers) {
                Some(delay) => failure.with_retry_after(delay),
                None => failure,
            }
        }
        s if s.is_client_error() => Failure::validation(describe("Invalid request")),
        _ => Failure::upstream_unavailable("Upstream service unavailable"),
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
