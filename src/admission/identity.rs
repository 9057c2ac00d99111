//! Client identity derivation.
//!
//! # Responsibilities
//! - Extract the client address from X-Forwarded-For / X-Real-IP
//! - Degrade to a shared sentinel bucket when neither is present
//!
//! # Design Decisions
//! - Malformed headers are tolerated, never rejected; a proxy that does
//!   not forward the client IP costs precision, not availability
//! - Only the first X-Forwarded-For entry is trusted (the client as seen
//!   by the first proxy)

use axum::http::HeaderMap;

/// Shared bucket for requests with no usable forwarding headers.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Derive the rate-limiting identity for a request.
///
/// Takes the first comma-separated entry of `x-forwarded-for`, falls
/// back to `x-real-ip`, and finally to [`ANONYMOUS_IDENTITY`].
pub fn client_identity(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    ANONYMOUS_IDENTITY.to_string()
}
