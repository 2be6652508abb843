//! Gateway entry point.
//!
//! # Data Flow
//! ```text
//! Request
//!     → 1. origin check      → 403 {error} (no CORS headers)
//!     → 2. CORS headers      (wildcard on failure)
//!     → 3. OPTIONS           → 204 + CORS
//!     → 4. API key           → 401 {error} + CORS
//!     → 5. route match       → 404 {error} + CORS
//!     → 6. handler           (Err or panic → 500 {message})
//!     → 7. merge CORS into the handler response
//! ```
//!
//! # Design Decisions
//! - The order above is fixed; each terminal step skips everything after it
//! - Collaborators are trait objects so tests can swap in fixed rules
//! - The route table is built once and passed in, never global

mod pipeline;

pub use pipeline::{Gateway, NOT_FOUND_MESSAGE, ORIGIN_NOT_ALLOWED_MESSAGE};
