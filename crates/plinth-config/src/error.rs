//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The named file does not exist.
    #[error("configuration file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Neither TOML nor JSON, judged by extension or by the format argument.
    #[error("unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The rejected extension or format name.
        format: String,
    },

    /// TOML that does not match [`PlinthConfig`](crate::PlinthConfig).
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON that does not match [`PlinthConfig`](crate::PlinthConfig).
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A present `.env` file that could not be loaded.
    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A setting outside what the binder accepts.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted setting name, e.g. `binding.max_walk_depth`.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A `PREFIX__SECTION__KEY` variable whose value does not parse.
    #[error("invalid override {var}: {reason}")]
    InvalidOverride {
        /// The environment variable name.
        var: String,
        /// What was expected.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_override(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOverride {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
