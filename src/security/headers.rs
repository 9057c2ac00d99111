//! Baseline security response headers.
//!
//! # Responsibilities
//! - Inject a fixed Content-Security-Policy on every response
//! - Add hardening companions (nosniff, frame options, referrer policy)
//!
//! # Design Decisions
//! - One fixed directive string; per-route policies are out of scope
//! - script/style inline and eval allowances are a development-time
//!   relaxation; tighten for production

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Fixed CSP directive string restricting sources to self.
pub const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' data: https:; \
    font-src 'self'; \
    connect-src 'self'; \
    frame-ancestors 'self'; \
    form-action 'self'; \
    base-uri 'self'";

/// Middleware function injecting security headers on every response.
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}
