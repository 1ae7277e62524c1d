//! Root configuration type.

use chrono::format::{Item, StrftimeItems};
use plinth_bind::BindOptions;
use plinth_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::{BindingConfig, ConfigError, LogFormat, LoggingConfig};

/// Upper bound accepted for `binding.max_walk_depth`.
pub const MAX_WALK_DEPTH_LIMIT: usize = 1024;

/// Complete Plinth configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables on top of the defaults.
///
/// # Example
///
/// ```
/// use plinth_config::PlinthConfig;
///
/// let config = PlinthConfig::default();
/// assert_eq!(config.binding.max_walk_depth, 64);
/// assert_eq!(config.bind_options().max_body_bytes, 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PlinthConfig {
    /// Binding engine settings.
    #[serde(default)]
    pub binding: BindingConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PlinthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `binding.max_body_bytes` is zero
    /// - `binding.max_walk_depth` is outside `1..=1024`
    /// - `binding.time_format` is not a valid strftime format
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.binding.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "binding.max_body_bytes",
                "must be greater than 0",
            ));
        }

        if !(1..=MAX_WALK_DEPTH_LIMIT).contains(&self.binding.max_walk_depth) {
            return Err(ConfigError::invalid_value(
                "binding.max_walk_depth",
                format!("must be between 1 and {MAX_WALK_DEPTH_LIMIT}"),
            ));
        }

        if let Some(format) = &self.binding.time_format {
            if format.is_empty()
                || StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
            {
                return Err(ConfigError::invalid_value(
                    "binding.time_format",
                    format!("invalid strftime format: {format:?}"),
                ));
            }
        }

        if self.logging.enabled {
            plinth_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Development preset: pretty `debug` logs with source locations.
    ///
    /// ```
    /// use plinth_config::{LogFormat, PlinthConfig};
    ///
    /// let config = PlinthConfig::development();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// Production preset: JSON `info` logs.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.include_location = false;
        config
    }

    /// Engine options derived from the `binding` section.
    #[must_use]
    pub fn bind_options(&self) -> BindOptions {
        BindOptions::from(&self.binding)
    }

    /// Subscriber settings derived from the `logging` section.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig::from(&self.logging)
    }
}

impl From<&BindingConfig> for BindOptions {
    fn from(config: &BindingConfig) -> Self {
        Self {
            max_body_bytes: config.max_body_bytes,
            max_walk_depth: config.max_walk_depth,
            time_format: config.time_format.clone(),
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        let base = match config.format {
            LogFormat::Json => Self::production(),
            LogFormat::Pretty => Self::development(),
        };
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            file_line_info: config.include_location,
            ..base
        }
    }
}
