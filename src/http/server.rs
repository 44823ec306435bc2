//! HTTP server setup and the forwarding handler.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (CORS, timeout, body limit, request ID, tracing)
//! - Dispatch matched routes to the forwarding engine
//! - Translate failures into the uniform error envelope
//!
//! The forwarding handler is a three-phase pipeline: build the
//! ProxiedRequest, execute it upstream, translate the outcome. Logging and
//! metrics observe each phase without steering it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, FromRequest, Multipart, State},
    http::{header, HeaderMap, HeaderValue, Method, Request},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::{GatewayConfig, RelayKind};
use crate::cors::{cors_middleware, OriginPolicy};
use crate::health::handlers as health;
use crate::http::error::GatewayError;
use crate::http::request::RequestIdLayer;
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::upload::{self, UploadConstraint};
use crate::upstream::{Forwarder, ForwarderBuildError, ProxiedRequest};

/// Upper bound for buffered JSON passthrough bodies.
const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024; // 10MB

/// Application state injected into handlers.
///
/// Everything here is immutable after startup; requests share it by Arc.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub routes: Arc<RouteTable>,
    pub forwarder: Arc<Forwarder>,
    pub upload: Arc<UploadConstraint>,
    pub started_at: Instant,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ForwarderBuildError> {
        let policy = Arc::new(OriginPolicy::from_config(&config.cors));
        let routes = Arc::new(RouteTable::from_config(&config.routes));
        let forwarder = Arc::new(Forwarder::new(&config.upstream, &config.timeouts)?);
        let upload = Arc::new(UploadConstraint::from_config(&config.upload));

        let state = AppState {
            config: Arc::new(config),
            routes,
            forwarder,
            upload,
            started_at: Instant::now(),
        };

        let router = Self::build_router(state, policy);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, policy: Arc<OriginPolicy>) -> Router {
        let config = state.config.clone();

        let mut router = Router::new()
            .route("/health", get(health::liveness))
            .route("/api/health", get(health::diagnostic));

        if config.diagnostics.probe_enabled {
            router = router.route("/api/diagnose", get(health::diagnose));
        }

        // Room for multipart framing around the file-size cap.
        let body_limit = config.upload.max_bytes + 64 * 1024;

        router
            .route("/api", any(gateway_handler))
            .route("/api/{*path}", any(gateway_handler))
            .fallback(route_not_found)
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(axum::middleware::from_fn_with_state(policy, cors_middleware))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main forwarding handler for `/api` and everything below it.
async fn gateway_handler(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, GatewayError> {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|q| q.to_string());

    // 1. Match route
    let Some(route_match) = state.routes.match_request(&method, &path, query.as_deref()) else {
        tracing::debug!(method = %method, path = %path, "No route matched");
        metrics::record_request(method.as_str(), 404, "none", start);
        return Err(GatewayError::RouteNotFound { method, path });
    };
    let route_name = route_match.rule.name.clone();
    let relay = route_match.rule.relay;
    let target = route_match.target;

    tracing::debug!(
        method = %method,
        path = %path,
        route = %route_name,
        target = %target,
        "Route matched"
    );

    // 2. Build the outbound request
    let proxied = match relay {
        RelayKind::Multipart => {
            let multipart = Multipart::from_request(req, &())
                .await
                .map_err(|e| GatewayError::Multipart(e.to_string()))?;
            let relayed = upload::extract(multipart, &state.upload).await?;
            ProxiedRequest::multipart(target, relayed.into_form()?)
        }
        RelayKind::Json => {
            let headers = forward_headers(req.headers());
            if method == Method::GET {
                ProxiedRequest::get(target, headers)
            } else {
                let body = json_body(req, &method).await?;
                ProxiedRequest::json(method.clone(), target, headers, body)
            }
        }
    };

    // 3. Execute and translate
    match state.forwarder.execute(proxied).await {
        Ok(payload) => {
            metrics::record_request(method.as_str(), 200, &route_name, start);
            Ok(Json(payload).into_response())
        }
        Err(e) => {
            let err = GatewayError::from(e);
            metrics::record_request(method.as_str(), err.status().as_u16(), &route_name, start);
            Err(err)
        }
    }
}

/// Fallback for anything outside the API surface. Static assets are an
/// external collaborator; the gateway only reports the miss.
async fn route_not_found(req: Request<Body>) -> GatewayError {
    GatewayError::RouteNotFound {
        method: req.method().clone(),
        path: req.uri().path().to_string(),
    }
}

/// The header subset forwarded upstream on JSON passthrough.
fn forward_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in [header::ACCEPT, header::AUTHORIZATION] {
        if let Some(value) = inbound.get(&name) {
            headers.insert(name, value.clone());
        }
    }
    headers
        .entry(header::ACCEPT)
        .or_insert(HeaderValue::from_static("application/json"));
    headers
}

/// Parse the inbound body for methods that carry one. The body is
/// re-serialized for the upstream call, never streamed raw.
async fn json_body(req: Request<Body>, method: &Method) -> Result<Option<Value>, GatewayError> {
    if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return Ok(None);
    }

    let bytes = axum::body::to_bytes(req.into_body(), JSON_BODY_LIMIT)
        .await
        .map_err(|e| GatewayError::BodyRead(e.to_string()))?;

    if bytes.is_empty() {
        return Ok(None);
    }

    let value = serde_json::from_slice(&bytes).map_err(GatewayError::InvalidJsonBody)?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_headers_defaults_accept_and_keeps_authorization() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        inbound.insert(header::COOKIE, HeaderValue::from_static("session=1"));

        let headers = forward_headers(&inbound);
        assert_eq!(headers.get(header::ACCEPT).unwrap(), "application/json");
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer t");
        // Hop-by-hop and cookie headers stay behind.
        assert!(headers.get(header::COOKIE).is_none());
    }

    #[tokio::test]
    async fn json_body_is_skipped_for_bodyless_methods() {
        let req = Request::builder()
            .method(Method::DELETE)
            .body(Body::from(r#"{"ignored": true}"#))
            .unwrap();
        assert!(json_body(req, &Method::DELETE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unparseable_json_body_is_a_client_error() {
        let req = Request::builder()
            .method(Method::POST)
            .body(Body::from("{not json"))
            .unwrap();
        let err = json_body(req, &Method::POST).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidJsonBody(_)));
    }
}
