//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Collect per-domain route contributions into one flat table
//! - Look up the matching route for a request
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) method lookup via HashMap, O(n) path scan within a method
//! - Registration order is preserved: the first registered route wins
//! - Duplicate (method, pattern) pairs are logged, not rejected

use std::collections::{HashMap, HashSet};

use axum::{
    body::Body,
    http::{Method, Request},
};

use crate::routing::matcher::PathParams;
use crate::routing::route::Route;

/// Ordered collection of routes, assembled by concatenating contributions.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one route after everything already registered.
    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Append a contribution (typically one domain's routes), keeping its order.
    pub fn extend<I>(&mut self, routes: I)
    where
        I: IntoIterator<Item = Route>,
    {
        self.routes.extend(routes);
    }

    /// Builder form of [`RouteTable::extend`].
    pub fn with_routes<I>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = Route>,
    {
        self.extend(routes);
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: PathParams,
}

/// Frozen route registry.
#[derive(Debug)]
pub struct Router {
    by_method: HashMap<Method, Vec<Route>>,
    len: usize,
}

impl Router {
    pub fn new(table: RouteTable) -> Self {
        let mut by_method: HashMap<Method, Vec<Route>> = HashMap::new();
        let mut seen: HashSet<(Method, String)> = HashSet::new();
        let len = table.len();

        for route in table.routes {
            let key = (route.method().clone(), route.pattern().as_str().to_string());
            if !seen.insert(key) {
                tracing::warn!(
                    method = %route.method(),
                    pattern = %route.pattern(),
                    "Duplicate route registered; the earlier registration wins"
                );
            }
            by_method.entry(route.method().clone()).or_default().push(route);
        }

        tracing::debug!(routes = len, methods = by_method.len(), "Router compiled");
        Self { by_method, len }
    }

    /// Find the first registered route matching `req`.
    pub fn match_request(&self, req: &Request<Body>) -> Option<RouteMatch<'_>> {
        self.by_method.get(req.method())?.iter().find_map(|route| {
            route
                .pattern()
                .matches(req.uri().path())
                .map(|params| RouteMatch { route, params })
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<RouteTable> for Router {
    fn from(table: RouteTable) -> Self {
        Self::new(table)
    }
}
