//! Configuration sections.

use plinth_bind::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_WALK_DEPTH};
use serde::{Deserialize, Serialize};

/// Binding engine section.
///
/// ```toml
/// [binding]
/// max_body_bytes = 1048576
/// max_walk_depth = 64
/// time_format = "%Y-%m-%d %H:%M:%S"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Deepest nesting the resolver walk will enter.
    #[serde(default = "default_max_walk_depth")]
    pub max_walk_depth: usize,

    /// Default strftime format for timestamp parameters. RFC 3339 when unset.
    #[serde(default)]
    pub time_format: Option<String>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            max_walk_depth: default_max_walk_depth(),
            time_format: None,
        }
    }
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_max_walk_depth() -> usize {
    DEFAULT_MAX_WALK_DEPTH
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `EnvFilter` directive (e.g. `info`, `plinth_bind=debug,warn`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
