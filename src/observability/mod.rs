//! Observability subsystem.
//!
//! Logging and metrics are observers attached at phase boundaries; they
//! never participate in control flow.

pub mod metrics;
