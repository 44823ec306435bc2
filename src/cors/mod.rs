//! Cross-origin policy subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Origin header)
//!     → policy.rs (ALLOW/DENY + exact echo value)
//!     → middleware.rs (preflight short-circuit, response decoration)
//! ```
//!
//! # Design Decisions
//! - The evaluator is a pure function over the literal Origin header
//! - Decoration happens in one place for success and error paths alike
//! - DENY omits headers; it never rejects the request itself

pub mod middleware;
pub mod policy;

pub use middleware::cors_middleware;
pub use policy::{OriginDecision, OriginPattern, OriginPolicy};
