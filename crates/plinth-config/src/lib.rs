//! Typed configuration for Plinth.
//!
//! - TOML and JSON files with strict parsing (unknown fields fail)
//! - `PLINTH__SECTION__KEY` environment overrides and `.env` loading
//! - Conversion into [`plinth_bind::BindOptions`] and
//!   [`plinth_telemetry::LogConfig`]
//!
//! # Configuration File Format
//!
//! ```toml
//! [binding]
//! max_body_bytes = 1048576
//! max_walk_depth = 64
//! time_format = "%Y-%m-%dT%H:%M:%S"
//!
//! [logging]
//! enabled = true
//! level = "plinth_bind=debug,info"
//! format = "json"
//! include_location = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `PLINTH__BINDING__MAX_BODY_BYTES=65536`
//! - `PLINTH__BINDING__MAX_WALK_DEPTH=32`
//! - `PLINTH__BINDING__TIME_FORMAT=%Y-%m-%d` (empty clears it)
//! - `PLINTH__LOGGING__ENABLED=false`
//! - `PLINTH__LOGGING__LEVEL=debug`
//! - `PLINTH__LOGGING__FORMAT=pretty`
//! - `PLINTH__LOGGING__INCLUDE_LOCATION=true`
//!
//! # Example
//!
//! ```no_run
//! use plinth_bind::Binder;
//! use plinth_config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("plinth.toml")?
//!     .with_env_prefix("PLINTH")
//!     .load()?;
//!
//! plinth_telemetry::init_logging(&config.log_config())?;
//! let binder = Binder::new(config.bind_options());
//! # let _ = binder;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/plinth-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{PlinthConfig, MAX_WALK_DEPTH_LIMIT};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{BindingConfig, LogFormat, LoggingConfig};
