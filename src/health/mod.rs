//! Health and diagnostics subsystem.
//!
//! Liveness is local-only; the reachability probe is out-of-band and never
//! feeds back into forwarding decisions.

pub mod handlers;
pub mod probe;

pub use probe::{probe_upstream, ProbeReport};
