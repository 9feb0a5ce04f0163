//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the backend URL and credential are usable in outbound requests
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate endpoints and mounts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
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

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    validate_backend(config, &mut errors);
    validate_endpoints(config, &mut errors);
    validate_mounts(config, &mut errors);

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.security.max_response_bytes == 0 {
        errors.push(ValidationError::new("security.max_response_bytes", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_backend(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let backend = &config.backend;

    match Url::parse(&backend.api_url) {
        Ok(url) => {
            if url.scheme() != "http" {
                errors.push(ValidationError::new(
                    "backend.api_url",
                    format!("unsupported scheme '{}', expected http", url.scheme()),
                ));
            }
            if url.host_str().is_none() {
                errors.push(ValidationError::new("backend.api_url", "missing host"));
            }
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::new(
                    "backend.api_url",
                    "must not carry a query or fragment",
                ));
            }
        }
        Err(e) => errors.push(ValidationError::new(
            "backend.api_url",
            format!("'{}' is not a valid URL: {}", backend.api_url, e),
        )),
    }

    if backend.api_key.is_empty() {
        errors.push(ValidationError::new("backend.api_key", "must not be empty"));
    } else if HeaderValue::from_str(&backend.api_key).is_err() {
        errors.push(ValidationError::new(
            "backend.api_key",
            "contains characters not allowed in a header value",
        ));
    }

    if HeaderName::from_bytes(backend.credential_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "backend.credential_header",
            format!("'{}' is not a valid header name", backend.credential_header),
        ));
    }
}

fn validate_endpoints(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();

    for (i, endpoint) in config.endpoints.allow.iter().enumerate() {
        let field = format!("endpoints.allow[{}]", i);

        if endpoint.name.is_empty() {
            errors.push(ValidationError::new(&field, "name must not be empty"));
        } else if endpoint.name.contains('/') {
            errors.push(ValidationError::new(
                &field,
                format!("name '{}' must not contain '/'", endpoint.name),
            ));
        }

        if !seen.insert(endpoint.name.as_str()) {
            errors.push(ValidationError::new(
                &field,
                format!("duplicate endpoint '{}'", endpoint.name),
            ));
        }

        let bad_segment = endpoint
            .backend_path()
            .split('/')
            .any(|s| s.is_empty() || s == "." || s == "..");
        if bad_segment {
            errors.push(ValidationError::new(
                &field,
                format!("path '{}' has an empty or relative segment", endpoint.backend_path()),
            ));
        }
    }
}

fn validate_mounts(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    if config.mounts.is_empty() {
        errors.push(ValidationError::new("mounts", "at least one mount is required"));
    }

    let mut seen = HashSet::new();
    for (i, mount) in config.mounts.iter().enumerate() {
        let field = format!("mounts[{}]", i);

        if !mount.path.starts_with('/') {
            errors.push(ValidationError::new(
                &field,
                format!("path '{}' must start with '/'", mount.path),
            ));
        }
        if mount.path.len() > 1 && mount.path.ends_with('/') {
            errors.push(ValidationError::new(
                &field,
                format!("path '{}' must not end with '/'", mount.path),
            ));
        }
        if mount.path == "/" {
            errors.push(ValidationError::new(&field, "cannot mount at the root path"));
        }
        // the router treats these as captures and refuses to build
        let capture = mount.path.contains('{')
            || mount.path.contains('}')
            || mount
                .path
                .split('/')
                .any(|s| s.starts_with(':') || s.starts_with('*'));
        if capture {
            errors.push(ValidationError::new(
                &field,
                format!("path '{}' must not contain route captures", mount.path),
            ));
        }
        if mount.path.trim_end_matches('/').split('/').skip(1).any(str::is_empty) {
            errors.push(ValidationError::new(
                &field,
                format!("path '{}' has an empty segment", mount.path),
            ));
        }
        if !seen.insert(mount.path.as_str()) {
            errors.push(ValidationError::new(
                &field,
                format!("duplicate mount path '{}'", mount.path),
            ));
        }
    }
}
