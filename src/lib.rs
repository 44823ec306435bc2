//! CORS gateway library.
//!
//! A single-upstream HTTP gateway: origin policy enforcement, prefix-rewrite
//! forwarding, multipart upload relay, and uniform error envelopes.

// Core subsystems
pub mod config;
pub mod cors;
pub mod http;
pub mod routing;

// Forwarding
pub mod upload;
pub mod upstream;

// Cross-cutting concerns
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
