//! Exit codes for the `spoolctl` CLI.
//!
//! Exit code ranges:
//! - 0-9: Operational outcomes (parse outcome from code, not output)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors

use spool_common::{Error, ErrorCategory};

/// Exit codes for spoolctl operations.
///
/// Stable contract for scripts driving the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // Operational outcomes (0-9)
    /// Success
    Clean = 0,

    /// Nothing to do (empty spool, nothing to sweep)
    NothingToDo = 1,

    /// The spool is full; the payload was not stored
    CapacityExceeded = 2,

    /// Some records could not be recovered or written out
    PartialFail = 3,

    // User / environment errors (10-19)
    /// Invalid arguments
    ArgsError = 10,

    /// Invalid configuration or unusable spool directory
    ConfigError = 11,

    // Internal errors (20-29)
    /// Internal error
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Codes 0-1.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::NothingToDo)
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::NothingToDo => "OK_NOTHING",
            ExitCode::CapacityExceeded => "ERR_CAPACITY",
            ExitCode::PartialFail => "ERR_PARTIAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Exit code for a spool error that ended a command.
    pub fn for_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Capacity => ExitCode::CapacityExceeded,
            ErrorCategory::Write | ErrorCategory::Read | ErrorCategory::Cleanup => {
                ExitCode::IoError
            }
            ErrorCategory::Decode => ExitCode::PartialFail,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_ranges() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::NothingToDo.is_success());
        assert!(!ExitCode::CapacityExceeded.is_error());
        assert!(ExitCode::ConfigError.is_error());
        assert!(ExitCode::IoError.is_error());
    }

    #[test]
    fn test_for_error() {
        assert_eq!(
            ExitCode::for_error(&Error::DirectoryNotAccessible {
                path: PathBuf::from("/nope")
            }),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::for_error(&Error::CapacityExceeded { capacity_mb: 1 }),
            ExitCode::CapacityExceeded
        );
        assert_eq!(
            ExitCode::for_error(&Error::DecodeCorrupt("x".into())),
            ExitCode::PartialFail
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::ArgsError.to_string(), "ERR_ARGS (10)");
        assert_eq!(i32::from(ExitCode::IoError), 21);
    }
}
