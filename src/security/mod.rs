//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (reject disallowed origins, compute CORS headers)
//!     → [preflight short-circuit]
//!     → api_key.rs (require / validate API key)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Rules are built once from config and shared read-only
//! - The gateway only sees the `OriginPolicy` / `ApiKeyGuard` traits
//! - Fail closed on origins, fail open (wildcard) on CORS header computation

pub mod api_key;
pub mod origin;

use thiserror::Error;

pub use api_key::{ApiKeyGuard, KeyCheckResult, KeyGuard};
pub use origin::{
    cors_headers_or_wildcard, wildcard_cors_headers, CorsPolicy, OriginClass, OriginPattern,
    OriginPolicy,
};

/// Error building or evaluating a security rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("invalid origin pattern `{pattern}`: {reason}")]
    InvalidOriginPattern { pattern: String, reason: String },
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),
    #[error("invalid header name `{0}`")]
    InvalidHeaderName(String),
    #[error("invalid header value for {field}: `{value}`")]
    InvalidHeaderValue { field: &'static str, value: String },
}
