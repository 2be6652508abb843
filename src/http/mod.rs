//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing span)
//!     → request.rs (correlation ID lookup)
//!     → gateway (origin, key, route, handler)
//!     → response.rs (synthesized bodies, CORS merge)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{path_params, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
