//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the gateway (routes, origin rules, key rules) from config
//! - Create the Axum router with a single fallback handler
//! - Wire up middleware (request ID, tracing)
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::gateway::Gateway;
use crate::http::request::{request_id, X_REQUEST_ID};
use crate::routing::{PatternError, Router as RouteRouter};
use crate::rpc::ServerOptions;
use crate::security::{CorsPolicy, KeyGuard, PolicyError};
use crate::services::build_route_table;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid security rules: {0}")]
    Policy(#[from] PolicyError),
    #[error("invalid route: {0}")]
    Route(#[from] PatternError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    gateway: Arc<Gateway>,
}

impl HttpServer {
    /// Create a server whose domains are backed by the configured upstreams.
    pub fn new(config: &GatewayConfig) -> Result<Self, ServerError> {
        let options = ServerOptions::new(config.limits.max_body_bytes);
        let table = build_route_table(config, &options)?;

        let gateway = Gateway::new(
            RouteRouter::new(table),
            Box::new(CorsPolicy::from_config(&config.cors)?),
            Box::new(KeyGuard::from_config(&config.api_keys)?),
        );
        Ok(Self::from_gateway(Arc::new(gateway)))
    }

    /// Serve an already assembled gateway.
    pub fn from_gateway(gateway: Arc<Gateway>) -> Self {
        let router = Self::build_router(gateway.clone());
        Self { router, gateway }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(gateway: Arc<Gateway>) -> Router {
        Router::new()
            .fallback(gateway_handler)
            .with_state(gateway)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            request_id = %request_id(req),
                            method = %req.method(),
                            path = %req.uri().path(),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.gateway.router().len(), "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn gateway_handler(State(gateway): State<Arc<Gateway>>, request: Request<Body>) -> Response {
    gateway.handle(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::services::Domain;
    use axum::http::{header, Method, StatusCode};
    use tower::ServiceExt;

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.api_keys.keys = vec!["test-key".into()];
        config.services = vec![ServiceConfig {
            domain: Domain::Seismology,
            upstream: "http://127.0.0.1:1/seismology".into(),
            rpcs: Vec::new(),
        }];
        config
    }

    #[tokio::test]
    async fn test_request_id_is_assigned_and_echoed() {
        let server = HttpServer::new(&config()).unwrap();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/seismology/v1/unknown")
            .header("X-WorldMonitor-Key", "test-key")
            .body(Body::empty())
            .unwrap();

        let response = server.router().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_client_request_id_is_kept() {
        let server = HttpServer::new(&config()).unwrap();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/seismology/v1/list-earthquakes")
            .header(header::ORIGIN, "https://worldmonitor.app")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();

        let response = server.router().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
    }

    #[test]
    fn test_invalid_rules_fail_construction() {
        let mut config = config();
        config.cors.allowed_origins.push("ftp://*.*".into());
        assert!(matches!(HttpServer::new(&config), Err(ServerError::Policy(_))));
    }
}
