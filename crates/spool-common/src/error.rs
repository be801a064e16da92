//! Error taxonomy for spool operations.
//!
//! Every failure the queue can run into has a stable code and a category.
//! Apart from [`Error::Config`], none of these escape the public queue
//! operations: enqueue reports them to the metrics sink and returns `false`,
//! dequeue logs them and returns `None`. The codes exist so that logs and the
//! operator CLI can be filtered without parsing messages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for spool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Directory or capacity configuration.
    Config,
    /// Backpressure: the spool is full.
    Capacity,
    /// Staging or committing a record.
    Write,
    /// Reading a claimed record back.
    Read,
    /// Record contents could not be turned into a transmission.
    Decode,
    /// Post-read cleanup.
    Cleanup,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Capacity => write!(f, "capacity"),
            ErrorCategory::Write => write!(f, "write"),
            ErrorCategory::Read => write!(f, "read"),
            ErrorCategory::Decode => write!(f, "decode"),
            ErrorCategory::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// Unified error type for the spool.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("directory {} must exist with read and write permissions", path.display())]
    DirectoryNotAccessible { path: PathBuf },

    // Capacity (20-29)
    #[error("local storage capacity ({capacity_mb}MB) has been exceeded")]
    CapacityExceeded { capacity_mb: u64 },

    // Write path (30-39)
    #[error("unable to create or write staging file: {0}")]
    Staging(#[source] std::io::Error),

    #[error("unable to rename file to permanent name: {0}")]
    Commit(#[source] std::io::Error),

    // Read path (40-49)
    #[error("unable to read record {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Decode (50-59)
    #[error("record type '{type_tag}' is not allowed")]
    DecodeRejected { type_tag: String },

    #[error("record is corrupt: {0}")]
    DecodeCorrupt(String),

    // Cleanup (60-69)
    #[error("unable to delete {} after {attempts} attempts: {source}", path.display())]
    Delete {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// - 10-19: Configuration errors
    /// - 20-29: Capacity
    /// - 30-39: Write path
    /// - 40-49: Read path
    /// - 50-59: Decode
    /// - 60-69: Cleanup
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::DirectoryNotAccessible { .. } => 11,
            Error::CapacityExceeded { .. } => 20,
            Error::Staging(_) => 30,
            Error::Commit(_) => 31,
            Error::Read { .. } => 40,
            Error::DecodeRejected { .. } => 50,
            Error::DecodeCorrupt(_) => 51,
            Error::Delete { .. } => 60,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::DirectoryNotAccessible { .. } => ErrorCategory::Config,
            Error::CapacityExceeded { .. } => ErrorCategory::Capacity,
            Error::Staging(_) | Error::Commit(_) => ErrorCategory::Write,
            Error::Read { .. } => ErrorCategory::Read,
            Error::DecodeRejected { .. } | Error::DecodeCorrupt(_) => ErrorCategory::Decode,
            Error::Delete { .. } => ErrorCategory::Cleanup,
        }
    }

    /// Returns whether retrying the same operation later may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => false,
            Error::DirectoryNotAccessible { .. } => false,

            // Drains as soon as a consumer dequeues
            Error::CapacityExceeded { .. } => true,

            // Disk full, transient locks
            Error::Staging(_) => true,
            Error::Commit(_) => true,
            Error::Read { .. } => true,

            // The bytes on disk will not change
            Error::DecodeRejected { .. } => false,
            Error::DecodeCorrupt(_) => false,

            Error::Delete { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, "boom")
    }

    #[test]
    fn test_error_codes_grouped_by_category() {
        let cases = [
            (Error::Config("x".into()), ErrorCategory::Config, 10),
            (
                Error::CapacityExceeded { capacity_mb: 10 },
                ErrorCategory::Capacity,
                20,
            ),
            (Error::Staging(io_err()), ErrorCategory::Write, 30),
            (Error::Commit(io_err()), ErrorCategory::Write, 31),
            (
                Error::Read {
                    path: PathBuf::from("a.tmp"),
                    source: io_err(),
                },
                ErrorCategory::Read,
                40,
            ),
            (
                Error::DecodeRejected {
                    type_tag: "exec".into(),
                },
                ErrorCategory::Decode,
                50,
            ),
            (Error::DecodeCorrupt("bad".into()), ErrorCategory::Decode, 51),
            (
                Error::Delete {
                    path: PathBuf::from("a.tmp"),
                    attempts: 2,
                    source: io_err(),
                },
                ErrorCategory::Cleanup,
                60,
            ),
        ];

        for (err, category, code) in cases {
            assert_eq!(err.category(), category, "{}", err);
            assert_eq!(err.code(), code, "{}", err);
        }
    }

    #[test]
    fn test_capacity_message_names_megabytes() {
        let err = Error::CapacityExceeded { capacity_mb: 10 };
        assert_eq!(
            err.to_string(),
            "local storage capacity (10MB) has been exceeded"
        );
    }

    #[test]
    fn test_decode_errors_not_recoverable() {
        assert!(!Error::DecodeRejected {
            type_tag: "x".into()
        }
        .is_recoverable());
        assert!(!Error::DecodeCorrupt("x".into()).is_recoverable());
        assert!(Error::CapacityExceeded { capacity_mb: 1 }.is_recoverable());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Write.to_string(), "write");
        assert_eq!(ErrorCategory::Cleanup.to_string(), "cleanup");
    }
}
