//! Capacity limits enforcement.
//!
//! A [`LimitsEnforcer`] owns a `[minimum, maximum]` range and a default for
//! one named property. Values outside the range are clamped to the closest
//! bound rather than rejected; textual values that do not parse fall back to
//! the default. Clamping is logged, since it silently changes what the
//! operator asked for.

use tracing::warn;

use crate::validate::{ConfigError, ConfigResult};
use crate::{CAPACITY_PROPERTY_NAME, DEFAULT_CAPACITY_MB, MAX_CAPACITY_MB, MIN_CAPACITY_MB};

/// Clamps a named integer property into an allowed range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitsEnforcer {
    name: String,
    minimum: u64,
    maximum: u64,
    default_value: u64,
    current_value: u64,
}

impl LimitsEnforcer {
    /// Build an enforcer from an optional textual property value.
    ///
    /// - absent or blank: the default is used
    /// - unparseable: the default is used and a warning is logged
    /// - out of range: clamped to the closest limit
    pub fn with_closest_limit(
        name: &str,
        minimum: u64,
        maximum: u64,
        default_value: u64,
        value: Option<&str>,
    ) -> ConfigResult<Self> {
        let mut enforcer = Self::unchecked(name, minimum, maximum, default_value)?;

        let current = match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => default_value,
            Some(text) => match text.parse::<i64>() {
                Ok(parsed) => enforcer.normalize(parsed),
                Err(_) => {
                    warn!(
                        property = name,
                        value = text,
                        default = default_value,
                        "unparseable value, using default"
                    );
                    default_value
                }
            },
        };

        enforcer.current_value = current;
        Ok(enforcer)
    }

    /// Build an enforcer whose current value is `value`, clamped.
    pub fn with_value(
        name: &str,
        minimum: u64,
        maximum: u64,
        default_value: u64,
        value: i64,
    ) -> ConfigResult<Self> {
        let mut enforcer = Self::unchecked(name, minimum, maximum, default_value)?;
        enforcer.current_value = enforcer.normalize(value);
        Ok(enforcer)
    }

    fn unchecked(name: &str, minimum: u64, maximum: u64, default_value: u64) -> ConfigResult<Self> {
        if minimum > maximum {
            return Err(ConfigError::InvalidLimits {
                name: name.to_string(),
                message: format!("minimum {} is above maximum {}", minimum, maximum),
            });
        }
        if default_value < minimum || default_value > maximum {
            return Err(ConfigError::InvalidLimits {
                name: name.to_string(),
                message: format!(
                    "default {} is outside [{}, {}]",
                    default_value, minimum, maximum
                ),
            });
        }

        Ok(LimitsEnforcer {
            name: name.to_string(),
            minimum,
            maximum,
            default_value,
            current_value: default_value,
        })
    }

    /// Clamp `value` into the allowed range.
    pub fn normalize(&self, value: i64) -> u64 {
        let clamped = if value < self.minimum as i64 {
            self.minimum
        } else if value as u64 > self.maximum {
            self.maximum
        } else {
            value as u64
        };

        if clamped as i64 != value {
            warn!(
                property = %self.name,
                requested = value,
                applied = clamped,
                "value outside [{}, {}], using closest limit",
                self.minimum,
                self.maximum
            );
        }

        clamped
    }

    /// The value chosen at construction time.
    pub fn current_value(&self) -> u64 {
        self.current_value
    }

    pub fn default_value(&self) -> u64 {
        self.default_value
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn minimum(&self) -> u64 {
        self.minimum
    }

    pub fn maximum(&self) -> u64 {
        self.maximum
    }
}

/// The enforcer for the spool's storage capacity (megabytes).
pub fn storage_capacity_enforcer(value: Option<&str>) -> ConfigResult<LimitsEnforcer> {
    LimitsEnforcer::with_closest_limit(
        CAPACITY_PROPERTY_NAME,
        MIN_CAPACITY_MB,
        MAX_CAPACITY_MB,
        DEFAULT_CAPACITY_MB,
        value,
    )
}
