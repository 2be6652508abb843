//! RPC contract shared by all domain services.
//!
//! # Data Flow
//! ```text
//! ServiceRoutes (service.rs)
//!     → decode request, call domain handler
//!     → Ok(reply)      → 200 JSON
//!     → Err(Failure)   → error_mapper.rs → 4xx/5xx JSON
//! ```
//!
//! # Design Decisions
//! - Handler failure is a value (`Result`), not an unwinding exception
//! - One mapper shared by every domain keeps error bodies consistent
//! - Internal failure messages are logged, never returned to clients

pub mod error_mapper;
pub mod failure;
pub mod service;

pub use error_mapper::{map_error_to_response, status_for};
pub use failure::{Failure, FailureKind, FieldViolation};
pub use service::{rpc_path, ErrorMapper, ServerOptions, ServiceRoutes};
