//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, upload limit > 0)
//! - Check URLs and origin patterns actually parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("upstream.base_url '{url}': {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error("route '{name}': {reason}")]
    InvalidRoute { name: String, reason: String },

    #[error("cors.allowed_origins entry '{0}' is not an origin (expected scheme://host[:port])")]
    InvalidOrigin(String),

    #[error("upload.max_bytes must be greater than zero")]
    ZeroUploadLimit,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::InvalidUpstreamUrl {
                    url: config.upstream.base_url.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            } else if url.host_str().is_none() {
                errors.push(ValidationError::InvalidUpstreamUrl {
                    url: config.upstream.base_url.clone(),
                    reason: "missing host".to_string(),
                });
            }
        }
        Err(e) => {
            errors.push(ValidationError::InvalidUpstreamUrl {
                url: config.upstream.base_url.clone(),
                reason: e.to_string(),
            });
        }
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::InvalidRoute {
            name: "<none>".to_string(),
            reason: "at least one route is required".to_string(),
        });
    }

    for route in &config.routes {
        if route.name.is_empty() {
            errors.push(ValidationError::InvalidRoute {
                name: route.path_prefix.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidRoute {
                name: route.name.clone(),
                reason: format!("path_prefix '{}' must start with '/'", route.path_prefix),
            });
        }
        if !route.upstream_prefix.is_empty() && !route.upstream_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidRoute {
                name: route.name.clone(),
                reason: format!(
                    "upstream_prefix '{}' must be empty or start with '/'",
                    route.upstream_prefix
                ),
            });
        }
    }

    for origin in &config.cors.allowed_origins {
        if !origin.contains("://") || origin.ends_with("://") {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    if config.upload.max_bytes == 0 {
        errors.push(ValidationError::ZeroUploadLimit);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
