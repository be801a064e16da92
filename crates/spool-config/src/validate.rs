//! Configuration errors and semantic validation.

use thiserror::Error;

use crate::spool::SpoolConfig;

/// Validation result type.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid limits for {name}: {message}")]
    InvalidLimits { name: String, message: String },
}

impl ConfigError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::Io { .. } => 60,
            ConfigError::Parse(_) => 61,
            ConfigError::InvalidValue { .. } => 65,
            ConfigError::InvalidLimits { .. } => 67,
        }
    }
}

/// Validate a spool configuration semantically.
///
/// The capacity itself is never rejected here; it is clamped by the
/// limits enforcer when the store opens.
pub fn validate_spool(config: &SpoolConfig) -> ConfigResult<()> {
    if config.cache_size == 0 {
        return Err(ConfigError::InvalidValue {
            field: "cache_size".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if config.delete_attempts == 0 {
        return Err(ConfigError::InvalidValue {
            field: "delete_attempts".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if let Some(dir) = &config.directory {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "directory".to_string(),
                message: "Must not be empty".to_string(),
            });
        }
    }

    Ok(())
}
