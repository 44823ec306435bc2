//! Upload relay subsystem.
//!
//! Buffers one constrained file part in memory and re-encodes it as a
//! fresh outbound multipart body. Constraint violations never reach the
//! upstream.

pub mod relay;

pub use relay::{extract, RelayedUpload, UploadConstraint, FILE_FIELD, TEXT_FIELD};
