//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, query)
//!     → table.rs (ordered prefix scan)
//!     → Return: RouteMatch (rule + rewritten target) or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Parse methods, freeze rule order
//!     → Immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - First match wins (declaration order)
//! - Rewriting preserves the path remainder and query string byte-for-byte

pub mod table;

pub use table::{RouteMatch, RouteRule, RouteTable};
