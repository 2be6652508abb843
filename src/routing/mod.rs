//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     per-domain Route[] contributions
//!     → RouteTable (concatenated in fixed domain order)
//!     → Router (indexed by method, frozen)
//!
//! Incoming Request (method, path)
//!     → router.rs (method lookup, ordered scan)
//!     → matcher.rs (segment match, parameter binding)
//!     → Return: RouteMatch or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by registration)

pub mod matcher;
pub mod route;
pub mod router;

pub use matcher::{PathParams, PathPattern, PatternError};
pub use route::{HandlerResult, Route, RouteHandler};
pub use router::{RouteMatch, RouteTable, Router};
