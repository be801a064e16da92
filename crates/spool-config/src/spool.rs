//! Typed `spool.json` configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::validate::{validate_spool, ConfigError, ConfigResult};
use crate::{DEFAULT_CACHE_SIZE, DEFAULT_DELETE_ATTEMPTS, DEFAULT_DELETE_BACKOFF_MS};

/// Capacity as written in a config file or environment variable.
///
/// Accepts both `"capacity_mb": 50` and `"capacity_mb": "50"`; the textual
/// form goes through the same closest-limit parsing as the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapacitySetting {
    Megabytes(i64),
    Text(String),
}

impl CapacitySetting {
    /// Textual form handed to the limits enforcer.
    pub fn as_text(&self) -> String {
        match self {
            CapacitySetting::Megabytes(mb) => mb.to_string(),
            CapacitySetting::Text(text) => text.clone(),
        }
    }
}

/// Which slice of a directory listing the oldest-file cache keeps on refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillOrder {
    /// Sort names descending and keep the first N. Under a backlog larger
    /// than N this surfaces the newest names first.
    #[default]
    HighestNamesRetained,
    /// Keep the N smallest names, so a backlog drains strictly oldest first.
    LowestNamesRetained,
}

impl std::str::FromStr for RefillOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "highest" | "highest_names_retained" => Ok(RefillOrder::HighestNamesRetained),
            "lowest" | "lowest_names_retained" | "oldest" => Ok(RefillOrder::LowestNamesRetained),
            _ => Err(format!("unknown refill order: {}", s)),
        }
    }
}

impl std::fmt::Display for RefillOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefillOrder::HighestNamesRetained => write!(f, "highest_names_retained"),
            RefillOrder::LowestNamesRetained => write!(f, "lowest_names_retained"),
        }
    }
}

/// Spool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolConfig {
    /// Storage directory. `None` means `<temp dir>/transmissions`.
    pub directory: Option<PathBuf>,

    /// Storage capacity in megabytes (clamped to [1, 1000]).
    pub capacity_mb: Option<CapacitySetting>,

    /// Candidate files kept per cache refill.
    pub cache_size: usize,

    /// Delete attempts for a consumed record.
    pub delete_attempts: u32,

    /// Pause between delete attempts, in milliseconds.
    pub delete_backoff_ms: u64,

    /// Cache refill order.
    pub refill_order: RefillOrder,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        SpoolConfig {
            directory: None,
            capacity_mb: None,
            cache_size: DEFAULT_CACHE_SIZE,
            delete_attempts: DEFAULT_DELETE_ATTEMPTS,
            delete_backoff_ms: DEFAULT_DELETE_BACKOFF_MS,
            refill_order: RefillOrder::default(),
        }
    }
}

impl SpoolConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate config JSON.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: SpoolConfig = serde_json::from_str(content)?;
        validate_spool(&config)?;
        Ok(config)
    }

    /// Capacity text for the limits enforcer, if configured.
    pub fn capacity_text(&self) -> Option<String> {
        self.capacity_mb.as_ref().map(CapacitySetting::as_text)
    }
}
