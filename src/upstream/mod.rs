//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! RouteMatch + inbound body
//!     → client.rs (build ProxiedRequest, execute with bounded timeout)
//!     → parsed upstream JSON
//!     → or error.rs classification, translated by http::error
//! ```

pub mod client;
pub mod error;

pub use client::{Forwarder, ForwarderBuildError, ProxiedBody, ProxiedRequest};
pub use error::UpstreamError;
