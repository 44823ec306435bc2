//! Origin policy evaluation.
//!
//! # Responsibilities
//! - Decide ALLOW/DENY from the literal `Origin` header value
//! - Produce the exact value to echo in `Access-Control-Allow-Origin`
//!
//! # Design Decisions
//! - Requests without an `Origin` header are allowed with no CORS headers
//!   (non-browser clients)
//! - Allowlist mode echoes the matched origin, never "*": wildcard origin
//!   with credentials is invalid per the CORS contract
//! - Wildcard-subdomain patterns match by scheme equality plus host suffix
//! - DENY means the response carries no CORS headers; the request itself is
//!   still served

use axum::http::HeaderValue;

use crate::config::schema::{CorsConfig, CorsMode};

/// One entry of the allowed-origin set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPattern {
    /// Byte-for-byte origin match.
    Exact(String),
    /// `scheme://*.suffix`: same scheme, host[:port] ends with `.suffix`.
    WildcardSuffix { scheme: String, suffix: String },
}

impl OriginPattern {
    /// Parse a configured entry. Entries of the form `scheme://*.rest`
    /// become wildcard patterns; everything else is an exact match.
    pub fn parse(entry: &str) -> Self {
        if let Some((scheme, rest)) = entry.split_once("://") {
            if let Some(suffix) = rest.strip_prefix("*.") {
                return Self::WildcardSuffix {
                    scheme: scheme.to_string(),
                    suffix: format!(".{}", suffix),
                };
            }
        }
        Self::Exact(entry.to_string())
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Exact(expected) => origin == expected,
            Self::WildcardSuffix { scheme, suffix } => {
                let Some(rest) = origin
                    .strip_prefix(scheme.as_str())
                    .and_then(|r| r.strip_prefix("://"))
                else {
                    return false;
                };
                // "host.suffix" must have a non-empty label before the suffix.
                rest.len() > suffix.len() && rest.ends_with(suffix.as_str())
            }
        }
    }
}

/// Outcome of evaluating one request's origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// Origin is permitted. `echo` is the exact `Access-Control-Allow-Origin`
    /// value to emit, or `None` when the request carried no origin and no
    /// CORS headers are required.
    Allow { echo: Option<HeaderValue> },
    /// Origin is not permitted; emit no CORS headers.
    Deny,
}

/// Immutable origin policy, compiled from configuration at startup.
#[derive(Debug)]
pub struct OriginPolicy {
    mode: CorsMode,
    patterns: Vec<OriginPattern>,
    allow_credentials: bool,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl OriginPolicy {
    /// Compile the policy from configuration.
    pub fn from_config(cors: &CorsConfig) -> Self {
        let patterns = cors
            .allowed_origins
            .iter()
            .map(|entry| OriginPattern::parse(entry))
            .collect();

        Self {
            mode: cors.mode,
            patterns,
            allow_credentials: cors.allow_credentials,
            allow_methods: joined_header(&cors.allowed_methods),
            allow_headers: joined_header(&cors.allowed_headers),
            max_age: HeaderValue::from_str(&cors.max_age_secs.to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("0")),
        }
    }

    /// Evaluate the literal `Origin` header value, if present.
    pub fn evaluate(&self, origin: Option<&str>) -> OriginDecision {
        let Some(origin) = origin else {
            return OriginDecision::Allow { echo: None };
        };

        match self.mode {
            CorsMode::Permissive => {
                let echo = if self.allow_credentials {
                    HeaderValue::from_str(origin).ok()
                } else {
                    Some(HeaderValue::from_static("*"))
                };
                match echo {
                    Some(echo) => OriginDecision::Allow { echo: Some(echo) },
                    None => OriginDecision::Deny,
                }
            }
            CorsMode::Allowlist => {
                if self.patterns.iter().any(|p| p.matches(origin)) {
                    match HeaderValue::from_str(origin) {
                        Ok(echo) => OriginDecision::Allow { echo: Some(echo) },
                        Err(_) => OriginDecision::Deny,
                    }
                } else {
                    OriginDecision::Deny
                }
            }
        }
    }

    /// Whether responses advertise credential support.
    pub fn allow_credentials(&self) -> bool {
        self.allow_credentials
    }

    /// Precomputed `Access-Control-Allow-Methods` value.
    pub fn allow_methods(&self) -> &HeaderValue {
        &self.allow_methods
    }

    /// Precomputed `Access-Control-Allow-Headers` value.
    pub fn allow_headers(&self) -> &HeaderValue {
        &self.allow_headers
    }

    /// Precomputed `Access-Control-Max-Age` value.
    pub fn max_age(&self) -> &HeaderValue {
        &self.max_age
    }
}

fn joined_header(values: &[String]) -> HeaderValue {
    HeaderValue::from_str(&values.join(", "))
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}
