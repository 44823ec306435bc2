//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream API all requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Route definitions mapping inbound prefixes to upstream prefixes.
    pub routes: Vec<RouteConfig>,

    /// Upload relay constraints.
    pub upload: UploadConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Diagnostic endpoint settings.
    pub diagnostics: DiagnosticsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            cors: CorsConfig::default(),
            routes: default_routes(),
            upload: UploadConfig::default(),
            timeouts: TimeoutConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
        }
    }
}

/// Upstream target configuration. Immutable for the process lifetime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the upstream API (scheme, host, port).
    pub base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

/// Origin policy operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorsMode {
    /// Only origins in `allowed_origins` receive CORS headers.
    Allowlist,
    /// Any origin receives CORS headers.
    Permissive,
}

/// Cross-origin policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Operating mode: explicit allowlist or permissive.
    pub mode: CorsMode,

    /// Exact origins or wildcard-subdomain patterns ("https://*.example.com").
    pub allowed_origins: Vec<String>,

    /// Whether responses allow credentialed requests.
    pub allow_credentials: bool,

    /// Methods advertised on preflight responses.
    pub allowed_methods: Vec<String>,

    /// Headers advertised on preflight responses.
    pub allowed_headers: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            mode: CorsMode::Allowlist,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            allow_credentials: true,
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_headers: [
                "Content-Type",
                "Authorization",
                "X-Requested-With",
                "Accept",
                "Origin",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_age_secs: 3600,
        }
    }
}

/// How a matched route's body is relayed upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayKind {
    /// JSON passthrough (re-serialized, not streamed raw).
    Json,
    /// Multipart upload relay (re-encoded outbound body).
    Multipart,
}

/// Route configuration mapping an inbound prefix to an upstream prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Inbound path prefix to match.
    pub path_prefix: String,

    /// Replacement prefix on the upstream side.
    pub upstream_prefix: String,

    /// Allowed methods. Empty means any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Body relay kind for this route.
    #[serde(default = "default_relay")]
    pub relay: RelayKind,
}

fn default_relay() -> RelayKind {
    RelayKind::Json
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            name: "map-data".to_string(),
            path_prefix: "/api/map".to_string(),
            upstream_prefix: "/map".to_string(),
            methods: vec!["GET".to_string()],
            relay: RelayKind::Json,
        },
        RouteConfig {
            name: "image-analysis".to_string(),
            path_prefix: "/api/ai/image".to_string(),
            upstream_prefix: "/ai/image".to_string(),
            methods: vec!["POST".to_string()],
            relay: RelayKind::Multipart,
        },
        RouteConfig {
            name: "api".to_string(),
            path_prefix: "/api".to_string(),
            upstream_prefix: String::new(),
            methods: Vec::new(),
            relay: RelayKind::Json,
        },
    ]
}

/// Upload relay constraints, applied before any upstream call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes.
    pub max_bytes: usize,

    /// Accepted MIME type prefixes (e.g., "image/").
    pub allowed_mime_prefixes: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 2 * 1024 * 1024, // 2MB
            allowed_mime_prefixes: vec!["image/".to_string()],
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time budget for one upstream call in seconds.
    pub upstream_secs: u64,

    /// Outer request timeout (inbound read + upstream + response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Diagnostic endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Enable the active reachability probe endpoint.
    pub probe_enabled: bool,

    /// Probe timeout in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            probe_enabled: true,
            probe_timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
