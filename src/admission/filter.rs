//! Admission filter middleware.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::admission::identity::client_identity;
use crate::admission::registry::{Decision, WindowRegistry};
use crate::config::AdmissionConfig;
use crate::observability::metrics;

/// Header reporting the configured per-window ceiling.
pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
/// Header reporting the allowance left after this request.
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Live admission parameters, swapped atomically on config reload.
#[derive(Debug, Clone)]
pub struct AdmissionSettings {
    pub enabled: bool,
    pub window: Duration,
    pub max_requests: u32,
    pub path_prefix: String,
}

impl From<&AdmissionConfig> for AdmissionSettings {
    fn from(config: &AdmissionConfig) -> Self {
        Self {
            enabled: config.enabled,
            window: Duration::from_millis(config.window_ms),
            max_requests: config.max_requests,
            path_prefix: config.path_prefix.clone(),
        }
    }
}

/// State for the admission filter, injected via axum middleware state.
///
/// The registry lives for the lifetime of the server; settings are read
/// through an [`ArcSwap`] so a reload never touches in-flight windows.
#[derive(Clone)]
pub struct AdmissionState {
    pub registry: Arc<WindowRegistry>,
    pub settings: Arc<ArcSwap<AdmissionSettings>>,
}

impl AdmissionState {
    pub fn new(config: &AdmissionConfig) -> Self {
        Self {
            registry: Arc::new(WindowRegistry::new()),
            settings: Arc::new(ArcSwap::from_pointee(AdmissionSettings::from(config))),
        }
    }

    /// Replace the live settings. Existing window records are kept.
    pub fn apply(&self, config: &AdmissionConfig) {
        self.settings.store(Arc::new(AdmissionSettings::from(config)));
    }
}

/// Middleware function for fixed-window request admission.
///
/// Requests outside the configured path prefix bypass throttling
/// entirely. Admitted requests are forwarded and annotated with
/// `X-RateLimit-*` headers; excess requests are answered with 429 and
/// never reach the inner handler.
pub async fn admission_middleware(
    State(state): State<AdmissionState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let settings = state.settings.load_full();

    if !settings.enabled || !request.uri().path().starts_with(&settings.path_prefix) {
        return next.run(request).await;
    }

    let identity = client_identity(request.headers());

    match state
        .registry
        .check(&identity, settings.max_requests, settings.window)
    {
        Decision::Admitted { remaining } => {
            metrics::record_admitted();
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(settings.max_requests));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
            response
        }
        Decision::Rejected => {
            tracing::warn!(client = %identity, ceiling = settings.max_requests, "Rate limit exceeded");
            metrics::record_rejected();
            rejection_response(&settings)
        }
    }
}

/// Build the fixed 429 rejection.
fn rejection_response(settings: &AdmissionSettings) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": "Too many requests. Please try again later." })),
    )
        .into_response();

    // Retry-After advertises the window length, rounded up to whole seconds.
    let retry_after = (settings.window.as_millis() as u64).div_ceil(1000);

    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(settings.max_requests));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from_static("0"));

    response
}
