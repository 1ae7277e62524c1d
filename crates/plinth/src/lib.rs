//! # Plinth
//!
//! **Request binding and validation for HTTP APIs**
//!
//! Plinth turns an incoming request into a typed input value. Every query,
//! header and path parameter is coerced, the JSON body is decoded and checked
//! against its constraints, and user resolvers run over the bound value.
//! Every problem found along the way is reported in one structured response.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plinth::prelude::*;
//!
//! #[derive(Input)]
//! #[input(crate = "plinth::bind")]
//! struct ListItems {
//!     #[input(query = "limit", schema = "limit_schema")]
//!     limit: u32,
//!     #[input(header = "x-request-id")]
//!     request_id: Option<String>,
//! }
//!
//! fn limit_schema() -> serde_json::Value {
//!     serde_json::json!({"minimum": 1, "maximum": 100})
//! }
//!
//! let config = ConfigLoader::new().with_env_prefix("PLINTH").load()?;
//! init_logging(&config.log_config())?;
//!
//! let binder = Binder::new(config.bind_options());
//! binder.register::<ListItems>()?;
//! let response = binder.handle::<ListItems, _>(&ctx, |input| {
//!     JsonResponse::new(input.limit).into_response()
//! });
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! params → coerce → check ─┐
//! body → decode → check ───┼→ assemble → resolve walk → 422 | handler
//!        (400 / 413 stop) ─┘
//! ```
//!
//! The derives expand to paths under `::plinth_bind`. When depending on this
//! facade alone, add `#[input(crate = "plinth::bind")]` or
//! `#[walk(crate = "plinth::bind")]`.

#![doc(html_root_url = "https://docs.rs/plinth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the binding engine
pub use plinth_bind as bind;

// Re-export configuration
pub use plinth_config as config;

// Re-export logging bootstrap
pub use plinth_telemetry as telemetry;

// Re-export derives
pub use plinth_macros::{Input, Walk};

/// Prelude module for convenient imports.
///
/// ```rust
/// use plinth::prelude::*;
/// ```
pub mod prelude {
    pub use plinth_bind::{
        BindContext, BindOptions, BindRejection, Binder, ErrorDetail, ErrorModel, Input,
        Resolve, ResolveScope, Walk, Walker,
    };

    pub use plinth_bind::response::{JsonResponse, NoContent, TextResponse};

    pub use plinth_config::{ConfigLoader, PlinthConfig};

    pub use plinth_telemetry::{init_logging, LogConfig};

    pub use plinth_macros::{Input, Walk};
}
