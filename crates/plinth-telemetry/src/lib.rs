//! Structured logging for Plinth services.
//!
//! The binding engine emits `tracing` events; this crate installs the
//! subscriber that renders them, as JSON for production or pretty-printed
//! for development, filtered through an `EnvFilter` directive.
//!
//! # Example
//!
//! ```rust,ignore
//! use plinth_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(shape = "CreateUser", "Registered input shape");
//! ```

#![doc(html_root_url = "https://docs.rs/plinth-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
