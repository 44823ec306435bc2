//! Upstream forwarding engine.
//!
//! # Responsibilities
//! - Own the single upstream target and the shared HTTP client
//! - Execute one ProxiedRequest per inbound request, with a bounded timeout
//! - Parse the upstream JSON body or classify the failure
//!
//! # Design Decisions
//! - Three call shapes only: GET passthrough, JSON passthrough, multipart
//! - All-or-nothing: the caller gets the full upstream payload or a typed
//!   error, never a partial forward
//! - The rewritten target is appended to the base URL verbatim; the query
//!   string is never re-encoded

use std::time::Duration;

use axum::http::{HeaderMap, Method};
use reqwest::multipart::Form;
use serde_json::Value;
use url::Url;

use crate::config::schema::{TimeoutConfig, UpstreamConfig};
use crate::upstream::error::UpstreamError;

/// User-Agent sent on every upstream call.
const USER_AGENT: &str = concat!("cors-gateway/", env!("CARGO_PKG_VERSION"));

/// Body of an outbound request.
pub enum ProxiedBody {
    Empty,
    /// Re-serialized JSON value.
    Json(Value),
    /// Freshly-built multipart form; its boundary drives the Content-Type.
    Multipart(Form),
}

/// One outbound call, owned by a single request task.
pub struct ProxiedRequest {
    pub method: Method,
    /// Rewritten path plus original query string.
    pub target: String,
    /// Header subset to forward.
    pub headers: HeaderMap,
    pub body: ProxiedBody,
}

impl ProxiedRequest {
    /// GET passthrough: no body.
    pub fn get(target: String, headers: HeaderMap) -> Self {
        Self {
            method: Method::GET,
            target,
            headers,
            body: ProxiedBody::Empty,
        }
    }

    /// Generic passthrough: JSON body for the methods that carry one.
    pub fn json(method: Method, target: String, headers: HeaderMap, body: Option<Value>) -> Self {
        Self {
            method,
            target,
            headers,
            body: body.map_or(ProxiedBody::Empty, ProxiedBody::Json),
        }
    }

    /// Multipart passthrough: the relay's constructed form.
    pub fn multipart(target: String, form: Form) -> Self {
        Self {
            method: Method::POST,
            target,
            headers: HeaderMap::new(),
            body: ProxiedBody::Multipart(form),
        }
    }
}

/// Error building the forwarder at startup.
#[derive(Debug, thiserror::Error)]
pub enum ForwarderBuildError {
    #[error("invalid upstream base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Issues upstream calls against the single configured target.
pub struct Forwarder {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Forwarder {
    /// Build the forwarder from configuration.
    pub fn new(
        upstream: &UpstreamConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, ForwarderBuildError> {
        // Validation has already run, but the forwarder must not trust that.
        Url::parse(&upstream.base_url)?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: upstream.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    /// The configured upstream base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full upstream URL for a rewritten target.
    fn target_url(&self, target: &str) -> String {
        format!("{}{}", self.base_url, target)
    }

    /// Execute one call and parse the upstream body as JSON.
    ///
    /// Success is an upstream status in [200, 300); anything else is a
    /// classified `UpstreamError` for the translator.
    pub async fn execute(&self, request: ProxiedRequest) -> Result<Value, UpstreamError> {
        let url = self.target_url(&request.target);

        tracing::debug!(
            method = %request.method,
            url = %url,
            "Forwarding request upstream"
        );

        let mut builder = self
            .client
            .request(request.method, &url)
            .timeout(self.timeout)
            .headers(request.headers);

        builder = match request.body {
            ProxiedBody::Empty => builder,
            ProxiedBody::Json(value) => builder.json(&value),
            ProxiedBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await.map_err(UpstreamError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status { status });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(UpstreamError::from_transport)?;

        serde_json::from_slice(&bytes).map_err(UpstreamError::Protocol)
    }
}
