//! Liveness and diagnostic endpoints.
//!
//! `/health` is a liveness probe: always 200, never touches the upstream.
//! `/api/health` adds the configured upstream target for debugging.
//! `/api/diagnose` runs the active reachability probe.

use std::time::Duration;

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::health::probe;
use crate::http::server::AppState;

/// GET /health: process liveness, independent of upstream availability.
pub async fn liveness(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "cors-gateway",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/health: diagnostic view including the configured upstream.
pub async fn diagnostic(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "cors-gateway",
        "upstream": state.forwarder.base_url(),
        "cors_mode": state.config.cors.mode,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// GET /api/diagnose: active reachability probe against the upstream.
pub async fn diagnose(State(state): State<AppState>) -> impl IntoResponse {
    let timeout = Duration::from_secs(state.config.diagnostics.probe_timeout_secs);
    let report = probe::probe_upstream(state.forwarder.base_url(), timeout).await;
    Json(report)
}
