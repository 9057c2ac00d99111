//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones. Returns all
//! validation errors, not just the first, so a broken config can be
//! fixed in one pass.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("admission.window_ms must be greater than zero")]
    ZeroWindow,

    #[error("admission.max_requests must be greater than zero")]
    ZeroCeiling,

    #[error("admission.path_prefix must start with '/' (got {0:?})")]
    BadPathPrefix(String),

    #[error("listener.bind_address is not a valid socket address (got {0:?})")]
    BadBindAddress(String),

    #[error("listener.tls requires both cert_path and key_path to be set")]
    IncompleteTls,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.admission.window_ms == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    if config.admission.max_requests == 0 {
        errors.push(ValidationError::ZeroCeiling);
    }
    if !config.admission.path_prefix.starts_with('/') {
        errors.push(ValidationError::BadPathPrefix(
            config.admission.path_prefix.clone(),
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::IncompleteTls);
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
