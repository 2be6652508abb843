//! Route definition: a (method, path pattern, handler) binding.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
};
use futures_util::future::{BoxFuture, FutureExt};

use crate::routing::matcher::{PathPattern, PatternError};
use crate::rpc::Failure;

/// What a handler produces: a response, or a domain failure.
pub type HandlerResult = Result<Response, Failure>;

/// Type-erased async handler shared by every clone of a route.
pub type RouteHandler = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// An immutable route table entry.
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: PathPattern,
    handler: RouteHandler,
}

impl Route {
    /// Build a route from an async function.
    pub fn new<F, Fut>(method: Method, pattern: &str, handler: F) -> Result<Self, PatternError>
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let handler: RouteHandler = Arc::new(move |req| handler(req).boxed());
        Ok(Self::from_parts(method, PathPattern::parse(pattern)?, handler))
    }

    fn from_parts(method: Method, pattern: PathPattern, handler: RouteHandler) -> Self {
        Self {
            method,
            pattern,
            handler,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}
