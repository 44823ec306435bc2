//! Classification of upstream call outcomes.
//!
//! A pure mapping from transport outcome to a typed failure. The HTTP-facing
//! envelope translation lives in `http::error`; this module only decides
//! what went wrong.

use axum::http::StatusCode;

/// Failure of one upstream call.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Connection refused or host unreachable.
    #[error("upstream unreachable: {0}")]
    Unavailable(reqwest::Error),

    /// The bounded call timeout expired.
    #[error("upstream call timed out: {0}")]
    Timeout(reqwest::Error),

    /// The upstream answered outside [200, 300).
    #[error("upstream responded with status {status}")]
    Status { status: StatusCode },

    /// The upstream body was not valid JSON where JSON was expected.
    #[error("upstream returned a non-JSON body: {0}")]
    Protocol(#[source] serde_json::Error),

    /// Any other transport-level failure (e.g., connection reset mid-body).
    #[error("upstream transport error: {0}")]
    Transport(reqwest::Error),
}

impl UpstreamError {
    /// Classify a reqwest transport error.
    ///
    /// Timeout takes precedence: a connect that times out is a timeout, not
    /// an unreachable host.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_connect() {
            Self::Unavailable(err)
        } else {
            Self::Transport(err)
        }
    }

    /// Upstream status code, for envelope `code` reporting.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(status.as_u16()),
            _ => None,
        }
    }
}
