//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0, addresses parse)
//! - Check origin patterns, header names and methods before they reach the security rules
//! - Detect services configured twice
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, ServiceConfig};
use crate::security::OriginPattern;

/// A single semantic problem found in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed config, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }

    validate_origins("cors.allowed_origins", &config.cors.allowed_origins, &mut errors);
    validate_origins("api_keys.keyless_origins", &config.api_keys.keyless_origins, &mut errors);

    if HeaderValue::from_str(&config.cors.fallback_origin).is_err() {
        errors.push(ValidationError::new("cors.fallback_origin", "not a valid header value"));
    }

    for method in &config.cors.allowed_methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_methods",
                format!("`{}` is not an HTTP method", method),
            ));
        }
    }

    for name in &config.cors.allowed_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_headers",
                format!("`{}` is not a header name", name),
            ));
        }
    }

    if HeaderName::from_bytes(config.api_keys.header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "api_keys.header",
            format!("`{}` is not a header name", config.api_keys.header),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    let mut seen = HashSet::new();
    for (i, service) in config.services.iter().enumerate() {
        if !seen.insert(service.domain) {
            errors.push(ValidationError::new(
                format!("services[{}].domain", i),
                format!("`{}` is configured more than once", service.domain),
            ));
        }
        validate_service(i, service, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_origins(field: &str, patterns: &[String], errors: &mut Vec<ValidationError>) {
    for pattern in patterns {
        if let Err(e) = pattern.parse::<OriginPattern>() {
            errors.push(ValidationError::new(field, e.to_string()));
        }
    }
}

fn validate_service(i: usize, service: &ServiceConfig, errors: &mut Vec<ValidationError>) {
    match Url::parse(&service.upstream) {
        Ok(url) if url.scheme() == "http" && url.host().is_some() => {}
        Ok(_) => errors.push(ValidationError::new(
            format!("services[{}].upstream", i),
            "must be an http:// URL with a host",
        )),
        Err(e) => errors.push(ValidationError::new(
            format!("services[{}].upstream", i),
            format!("`{}`: {}", service.upstream, e),
        )),
    }

    for rpc in &service.rpcs {
        if !is_valid_rpc_name(rpc) {
            errors.push(ValidationError::new(
                format!("services[{}].rpcs", i),
                format!("`{}` must be a single path segment without placeholders", rpc),
            ));
        }
    }
}

fn is_valid_rpc_name(rpc: &str) -> bool {
    !rpc.is_empty()
        && rpc
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
