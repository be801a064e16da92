//! Telemetry spool common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the spool crates:
//! - Process-scoped identity embedded in on-disk file names
//! - The error taxonomy for queue operations

pub mod error;
pub mod id;

pub use error::{Error, ErrorCategory, Result};
pub use id::ProcessToken;

/// Format version written into every record header.
pub const RECORD_FORMAT_VERSION: u32 = 1;
