//! Per-domain route builders.
//!
//! Every domain service contributes its RPCs through [`ServiceRoutes`]. RPCs
//! live at `POST /api/{domain}/v1/{rpc}` and share one [`ServerOptions`],
//! so all domains shape their errors through the same mapper.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::routing::{PatternError, Route};
use crate::rpc::error_mapper::map_error_to_response;
use crate::rpc::failure::Failure;

/// Converts a failure into the response a client sees.
pub type ErrorMapper = Arc<dyn Fn(&Failure) -> Response + Send + Sync>;

/// Options shared by every domain's route set.
#[derive(Clone)]
pub struct ServerOptions {
    pub on_error: ErrorMapper,
    pub max_body_bytes: usize,
}

impl ServerOptions {
    pub fn new(max_body_bytes: usize) -> Self {
        Self {
            on_error: Arc::new(map_error_to_response),
            max_body_bytes,
        }
    }

    pub fn with_error_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&Failure) -> Response + Send + Sync + 'static,
    {
        self.on_error = Arc::new(mapper);
        self
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::new(1024 * 1024)
    }
}

impl std::fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerOptions")
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

/// Path of an RPC: `/api/{domain}/v1/{rpc}`.
pub fn rpc_path(domain: &str, rpc: &str) -> String {
    format!("/api/{domain}/v1/{rpc}")
}

/// Collects the routes of a single domain service.
#[derive(Debug)]
pub struct ServiceRoutes {
    domain: String,
    options: ServerOptions,
    routes: Vec<Route>,
}

impl ServiceRoutes {
    pub fn new(domain: impl Into<String>, options: ServerOptions) -> Self {
        Self {
            domain: domain.into(),
            options,
            routes: Vec::new(),
        }
    }

    /// Register an RPC that receives the whole HTTP request.
    pub fn raw_rpc<F, Fut>(mut self, rpc: &str, handler: F) -> Result<Self, PatternError>
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, Failure>> + Send + 'static,
    {
        let on_error = self.options.on_error.clone();
        let handler = Arc::new(handler);

        let route = Route::new(Method::POST, &rpc_path(&self.domain, rpc), move |req| {
            let handler = handler.clone();
            let on_error = on_error.clone();
            async move {
                match handler(req).await {
                    Ok(response) => Ok(response),
                    Err(failure) => Ok(on_error(&failure)),
                }
            }
        })?;

        self.routes.push(route);
        Ok(self)
    }

    /// Register an RPC with a JSON request and a JSON response.
    ///
    /// An empty body decodes as `{}`.
    pub fn json_rpc<Req, Resp, F, Fut>(self, rpc: &str, handler: F) -> Result<Self, PatternError>
    where
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, Failure>> + Send + 'static,
    {
        let limit = self.options.max_body_bytes;
        let handler = Arc::new(handler);

        self.raw_rpc(rpc, move |req| {
            let handler = handler.clone();
            async move {
                let message: Req = decode_body(req.into_body(), limit).await?;
                let reply = handler(message).await?;
                Ok::<Response, Failure>((StatusCode::OK, Json(reply)).into_response())
            }
        })
    }

}

impl IntoIterator for ServiceRoutes {
    type Item = Route;
    type IntoIter = std::vec::IntoIter<Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}

async fn decode_body<T: DeserializeOwned>(body: Body, limit: usize) -> Result<T, Failure> {
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| Failure::validation("Request body too large or unreadable"))?;

    let input: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &bytes
    };

    serde_json::from_slice(input).map_err(|e| {
        Failure::validation("Invalid request body").with_violation("body", e.to_string())
    })
}
