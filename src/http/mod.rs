//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → cors middleware (preflight short-circuit, header decoration)
//!     → routing table (match + rewrite)
//!     → upstream forwarder (execute)
//!     → error.rs (translate failures into the envelope)
//! ```

pub mod error;
pub mod request;
pub mod server;

pub use error::{ErrorEnvelope, ErrorKind, GatewayError};
pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
