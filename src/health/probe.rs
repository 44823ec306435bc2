//! Active upstream reachability probe.
//!
//! # Responsibilities
//! - One bounded-timeout connection attempt against the upstream host:port
//! - Report reachability, HTTP status and headers, or the specific
//!   connection error
//!
//! This is a readiness/debugging probe; the forwarding engine never
//! consults it.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time;
use url::Url;

/// Result of one reachability probe.
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    /// The probed upstream base URL.
    pub target: String,

    /// Whether a TCP connection could be established within the timeout.
    pub reachable: bool,

    /// HTTP status of a follow-up GET, when one succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Response headers of the follow-up GET.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    /// The specific connection or request error, when one occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Probe duration in milliseconds.
    pub elapsed_ms: u64,

    /// RFC 3339 timestamp of the probe.
    pub timestamp: String,
}

impl ProbeReport {
    fn new(target: &str, start: Instant) -> Self {
        Self {
            target: target.to_string(),
            reachable: false,
            status: None,
            headers: None,
            error: None,
            elapsed_ms: start.elapsed().as_millis() as u64,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Probe the upstream: raw TCP connect first, then a GET for status and
/// headers. Each step is bounded by `timeout`.
pub async fn probe_upstream(base_url: &str, timeout: Duration) -> ProbeReport {
    let start = Instant::now();

    let (host, port) = match Url::parse(base_url) {
        Ok(url) => match (url.host_str().map(|h| h.to_string()), url.port_or_known_default()) {
            (Some(host), Some(port)) => (host, port),
            _ => {
                let mut report = ProbeReport::new(base_url, start);
                report.error = Some("upstream URL has no host or port".to_string());
                return report;
            }
        },
        Err(e) => {
            let mut report = ProbeReport::new(base_url, start);
            report.error = Some(format!("invalid upstream URL: {}", e));
            return report;
        }
    };

    match time::timeout(timeout, TcpStream::connect((host.as_str(), port))).await {
        Ok(Ok(_stream)) => {
            let mut report = ProbeReport::new(base_url, start);
            report.reachable = true;

            match fetch_status(base_url, timeout).await {
                Ok((status, headers)) => {
                    report.status = Some(status);
                    report.headers = Some(headers);
                }
                Err(e) => {
                    tracing::warn!(target = %base_url, error = %e, "Probe GET failed after connect");
                    report.error = Some(e);
                }
            }
            report.elapsed_ms = start.elapsed().as_millis() as u64;
            report
        }
        Ok(Err(e)) => {
            tracing::warn!(target = %base_url, error = %e, "Probe connect failed");
            let mut report = ProbeReport::new(base_url, start);
            report.error = Some(format!("connect failed: {}", e));
            report
        }
        Err(_) => {
            tracing::warn!(target = %base_url, "Probe connect timed out");
            let mut report = ProbeReport::new(base_url, start);
            report.error = Some(format!("connect timed out after {:?}", timeout));
            report
        }
    }
}

async fn fetch_status(
    base_url: &str,
    timeout: Duration,
) -> Result<(u16, BTreeMap<String, String>), String> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| e.to_string())?;

    let response = client.get(base_url).send().await.map_err(|e| e.to_string())?;

    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    Ok((response.status().as_u16(), headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_connection_reports_unreachable() {
        // Bind to an OS-assigned port, then drop the listener so the port
        // is closed when the probe runs.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let target = format!("http://{}", addr);
        let report = probe_upstream(&target, Duration::from_secs(1)).await;

        assert!(!report.reachable);
        assert!(report.status.is_none());
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn malformed_target_reports_error() {
        let report = probe_upstream("not a url", Duration::from_secs(1)).await;
        assert!(!report.reachable);
        assert!(report.error.unwrap().contains("invalid upstream URL"));
    }
}
