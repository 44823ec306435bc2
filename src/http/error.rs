//! Unified error envelope for the gateway.
//!
//! Every failing code path terminates in exactly one `ErrorEnvelope`; no
//! handler writes ad hoc error bodies. Upstream internals never reach the
//! client beyond a status code and a message string.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::upstream::error::UpstreamError;

/// Machine-readable failure classification, serialized into the envelope's
/// `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BackendUnavailable,
    BackendTimeout,
    BackendError,
    BackendProtocolViolation,
    ClientInputInvalid,
    RouteNotFound,
    Internal,
}

/// The uniform JSON wrapper used for all error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Failure classification.
    pub error: ErrorKind,

    /// Human-readable message for diagnostics.
    pub message: String,

    /// RFC 3339 timestamp of when the failure was translated.
    pub timestamp: String,

    /// Upstream status code, present only when the upstream responded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl ErrorEnvelope {
    fn new(error: ErrorKind, message: String, code: Option<u16>) -> Self {
        Self {
            error,
            message,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            code,
        }
    }
}

/// Crate-wide failure type. Each variant maps to exactly one
/// (status, kind) pair.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("request body is not valid JSON: {0}")]
    InvalidJsonBody(#[source] serde_json::Error),

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("no file field '{field}' in upload")]
    MissingFile { field: &'static str },

    #[error("file of {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: usize, max: usize },

    #[error("content type '{content_type}' is not accepted")]
    UnsupportedMediaType { content_type: String },

    #[error("no route for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Classification for the envelope's `error` field.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Upstream(UpstreamError::Unavailable(_))
            | Self::Upstream(UpstreamError::Transport(_)) => ErrorKind::BackendUnavailable,
            Self::Upstream(UpstreamError::Timeout(_)) => ErrorKind::BackendTimeout,
            Self::Upstream(UpstreamError::Status { .. }) => ErrorKind::BackendError,
            Self::Upstream(UpstreamError::Protocol(_)) => ErrorKind::BackendProtocolViolation,
            Self::InvalidJsonBody(_)
            | Self::BodyRead(_)
            | Self::Multipart(_)
            | Self::MissingFile { .. }
            | Self::FileTooLarge { .. }
            | Self::UnsupportedMediaType { .. } => ErrorKind::ClientInputInvalid,
            Self::RouteNotFound { .. } => ErrorKind::RouteNotFound,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status for the translated response.
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::BackendUnavailable | ErrorKind::BackendError => StatusCode::BAD_GATEWAY,
            ErrorKind::BackendTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::BackendProtocolViolation | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorKind::ClientInputInvalid => StatusCode::BAD_REQUEST,
            ErrorKind::RouteNotFound => StatusCode::NOT_FOUND,
        }
    }

    fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream(e) => e.upstream_status(),
            _ => None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        match kind {
            ErrorKind::Internal => {
                tracing::error!(error = %self, "Request failed");
            }
            ErrorKind::ClientInputInvalid | ErrorKind::RouteNotFound => {
                tracing::debug!(error = %self, "Request rejected");
            }
            _ => {
                tracing::warn!(error = %self, "Upstream call failed");
            }
        }

        let envelope = ErrorEnvelope::new(kind, self.to_string(), self.upstream_status());
        (status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_validation_failures_map_to_400() {
        let err = GatewayError::FileTooLarge {
            size: 3_000_000,
            max: 2_097_152,
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), ErrorKind::ClientInputInvalid);
    }

    #[test]
    fn non_2xx_upstream_maps_to_502_with_code() {
        let err = GatewayError::Upstream(UpstreamError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.kind(), ErrorKind::BackendError);
        assert_eq!(err.upstream_status(), Some(503));
    }

    #[test]
    fn route_not_found_maps_to_404() {
        let err = GatewayError::RouteNotFound {
            method: Method::GET,
            path: "/nope".to_string(),
        };
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn envelope_serializes_kind_as_snake_case_and_skips_absent_code() {
        let envelope = ErrorEnvelope::new(
            ErrorKind::BackendTimeout,
            "upstream call timed out".to_string(),
            None,
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"], "backend_timeout");
        assert!(json.get("code").is_none());
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn envelope_carries_upstream_code_when_present() {
        let envelope = ErrorEnvelope::new(ErrorKind::BackendError, "status 500".to_string(), Some(500));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["code"], 500);
    }
}
