//! Telemetry spool configuration loading and validation.
//!
//! This crate provides:
//! - The capacity limits enforcer (clamp to a min/max megabyte range)
//! - Typed `spool.json` configuration with semantic validation
//! - Config resolution (CLI → env → XDG → defaults)

pub mod limits;
pub mod resolve;
pub mod spool;
pub mod validate;

pub use limits::{storage_capacity_enforcer, LimitsEnforcer};
pub use resolve::{default_spool_dir, resolve_config, ConfigSource, Overrides, ResolvedConfig};
pub use spool::{CapacitySetting, RefillOrder, SpoolConfig};
pub use validate::{ConfigError, ConfigResult};

/// Default storage capacity in megabytes.
pub const DEFAULT_CAPACITY_MB: u64 = 10;

/// Largest storage capacity the spool accepts, in megabytes.
pub const MAX_CAPACITY_MB: u64 = 1000;

/// Smallest storage capacity the spool accepts, in megabytes.
pub const MIN_CAPACITY_MB: u64 = 1;

/// Property name reported when the configured capacity is clamped.
pub const CAPACITY_PROPERTY_NAME: &str = "Channel.MaxTransmissionStorageCapacityInMB";

/// Number of candidate files kept by the oldest-file cache.
pub const DEFAULT_CACHE_SIZE: usize = 128;

/// Delete attempts for a consumed record before it is left as an orphan.
pub const DEFAULT_DELETE_ATTEMPTS: u32 = 2;

/// Pause between delete attempts.
pub const DEFAULT_DELETE_BACKOFF_MS: u64 = 100;
