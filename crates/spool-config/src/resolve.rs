//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG config file → defaults.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::spool::{CapacitySetting, SpoolConfig};
use crate::validate::ConfigResult;

/// Where the config file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "SPOOL_CONFIG";
pub const ENV_SPOOL_DIR: &str = "SPOOL_DIR";
pub const ENV_CAPACITY_MB: &str = "SPOOL_CAPACITY_MB";

/// Standard config file name.
const CONFIG_FILENAME: &str = "spool.json";

/// Application name for XDG directories.
const APP_NAME: &str = "telemetry-spool";

/// Subdirectory of the system temp dir used when no directory is configured.
const DEFAULT_FOLDER: &str = "transmissions";

/// Explicit values from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub directory: Option<PathBuf>,
    pub capacity_mb: Option<i64>,
}

/// A fully resolved configuration.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: SpoolConfig,

    /// Config file that was loaded, if any.
    pub config_path: Option<PathBuf>,

    /// Where the config file came from (for diagnostics).
    pub source: ConfigSource,
}

impl ResolvedConfig {
    /// The storage directory, falling back to the default location.
    pub fn directory(&self) -> PathBuf {
        self.config
            .directory
            .clone()
            .unwrap_or_else(default_spool_dir)
    }
}

/// Resolve configuration from the process environment.
pub fn resolve_config(overrides: &Overrides) -> ConfigResult<ResolvedConfig> {
    resolve_with_env(overrides, |key| std::env::var(key).ok())
}

/// Resolve configuration using `env` for variable lookups.
///
/// 1. Config file: CLI path, then `SPOOL_CONFIG`, then
///    `<config dir>/telemetry-spool/spool.json`, then built-in defaults
/// 2. `SPOOL_DIR` / `SPOOL_CAPACITY_MB` override the file
/// 3. CLI directory / capacity override everything
pub fn resolve_with_env<F>(overrides: &Overrides, env: F) -> ConfigResult<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let (config_path, source) = locate_config_file(overrides.config_path.as_deref(), &env);

    let mut config = match &config_path {
        Some(path) => {
            debug!(path = %path.display(), source = %source, "loading spool config");
            SpoolConfig::load(path)?
        }
        None => SpoolConfig::default(),
    };

    if let Some(dir) = env(ENV_SPOOL_DIR).filter(|v| !v.is_empty()) {
        config.directory = Some(PathBuf::from(dir));
    }
    if let Some(capacity) = env(ENV_CAPACITY_MB) {
        config.capacity_mb = Some(CapacitySetting::Text(capacity));
    }

    if let Some(dir) = &overrides.directory {
        config.directory = Some(dir.clone());
    }
    if let Some(capacity) = overrides.capacity_mb {
        config.capacity_mb = Some(CapacitySetting::Megabytes(capacity));
    }

    Ok(ResolvedConfig {
        config,
        config_path,
        source,
    })
}

fn locate_config_file<F>(cli_path: Option<&Path>, env: &F) -> (Option<PathBuf>, ConfigSource)
where
    F: Fn(&str) -> Option<String>,
{
    // An explicit path is used even if missing, so the load error surfaces
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    if let Some(env_path) = env(ENV_CONFIG_PATH).filter(|v| !v.is_empty()) {
        return (Some(PathBuf::from(env_path)), ConfigSource::Environment);
    }

    if let Some(path) = xdg_config_dir().map(|d| d.join(CONFIG_FILENAME)) {
        if path.is_file() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Get the XDG config directory for the spool.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Default storage directory: `<system temp dir>/transmissions`.
pub fn default_spool_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_FOLDER)
}
