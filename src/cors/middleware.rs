//! CORS middleware.
//!
//! Applies the origin policy uniformly before any handler-specific logic
//! runs, so success and error paths cannot diverge in header behavior.
//! Preflight `OPTIONS` requests are answered here and never forwarded
//! upstream.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ORIGIN, VARY,
        },
        HeaderValue, Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::cors::policy::{OriginDecision, OriginPolicy};

pub async fn cors_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let decision = policy.evaluate(origin.as_deref());

    if req.method() == Method::OPTIONS {
        return preflight_response(&policy, &decision);
    }

    if matches!(decision, OriginDecision::Deny) {
        tracing::debug!(origin = origin.as_deref().unwrap_or(""), "Origin denied by policy");
    }

    let mut response = next.run(req).await;
    decorate(&policy, &decision, &mut response);
    response
}

/// Answer a preflight locally: 204, allow-methods/headers from static
/// configuration, no upstream call.
fn preflight_response(policy: &OriginPolicy, decision: &OriginDecision) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();

    if let OriginDecision::Allow { echo: Some(echo) } = decision {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, echo.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, policy.allow_methods().clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, policy.allow_headers().clone());
        headers.insert(ACCESS_CONTROL_MAX_AGE, policy.max_age().clone());
        if policy.allow_credentials() {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }

    response
}

/// Decorate a normal response. DENY omits CORS headers entirely; the
/// response body is served either way.
fn decorate(policy: &OriginPolicy, decision: &OriginDecision, response: &mut Response) {
    if let OriginDecision::Allow { echo: Some(echo) } = decision {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, echo.clone());
        if policy.allow_credentials() {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}
