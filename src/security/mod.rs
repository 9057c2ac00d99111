//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response (any path, admitted or rejected):
//!     → headers.rs (inject CSP + hardening headers)
//!     → Pass to client
//! ```
//!
//! # Design Decisions
//! - Headers are injected on the way out, so 429 rejections from the
//!   admission filter are covered too
//! - No trust in client input

pub mod headers;

pub use headers::{security_headers_middleware, CONTENT_SECURITY_POLICY_VALUE};
