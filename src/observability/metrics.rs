//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, rejections)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): total requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency distribution by route
//! - `gateway_rejections_total` (counter): requests stopped before dispatch, by reason
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - `route` is the matched pattern, never the raw path, to bound label cardinality

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Route label for requests that matched nothing.
pub const UNMATCHED_ROUTE: &str = "none";

/// Why a request was answered before reaching a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OriginNotAllowed,
    ApiKeyMissing,
    ApiKeyInvalid,
    NotFound,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Rejection::OriginNotAllowed => "origin_not_allowed",
            Rejection::ApiKeyMissing => "api_key_missing",
            Rejection::ApiKeyInvalid => "api_key_invalid",
            Rejection::NotFound => "not_found",
        }
    }
}

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "gateway_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: Rejection) {
    metrics::counter!("gateway_rejections_total", "reason" => reason.as_str()).increment(1);
}
