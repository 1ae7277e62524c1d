//! # Plinth Bind
//!
//! Turns an HTTP request into a strongly-typed input value, checks every
//! piece of it against declared constraints, runs user validation hooks over
//! the result and reports every problem found in one structured response.
//!
//! ## Pipeline
//!
//! | Stage | Module | Failure mode |
//! |-------|--------|--------------|
//! | Shape description | [`descriptor`] | internal (500), once per shape |
//! | Parameter coercion | [`coerce`] | recorded, binding continues |
//! | Body decoding | [`Binder`] | 400 / 413 on bad JSON or size, otherwise recorded |
//! | Resolver walk | [`walk`] | recorded, binding continues |
//! | Aggregation | [`ErrorSink`] | 422 with an [`ErrorModel`] |
//!
//! ## Example
//!
//! ```rust
//! use plinth_bind::{BindContextBuilder, Binder, BindRejection};
//! use plinth_bind::{Bound, DescriptorError, FieldDescriptor, Input, IntWidth};
//! use plinth_bind::{ParamKind, Source, TypeDescriptor, Walk, Walker};
//!
//! struct Page {
//!     size: i32,
//! }
//!
//! impl Walk for Page {
//!     fn walk_children(&self, _walker: &mut Walker<'_>) {}
//! }
//!
//! impl Input for Page {
//!     fn describe() -> Result<TypeDescriptor, DescriptorError> {
//!         TypeDescriptor::builder("Page")
//!             .field(FieldDescriptor::param("size", Source::Query, "size", ParamKind::Int(IntWidth::I32)))
//!             .build()
//!     }
//!
//!     fn assemble(bound: &mut Bound<'_>) -> Option<Self> {
//!         Some(Self { size: bound.param(0) })
//!     }
//! }
//!
//! let ctx = BindContextBuilder::new()
//!     .uri("/?size=big".parse().unwrap())
//!     .header("host", "example.com")
//!     .build();
//!
//! let Err(BindRejection::Unprocessable(model)) = Binder::default().bind::<Page>(&ctx) else {
//!     panic!("expected input errors");
//! };
//! assert_eq!(model.errors[0].message, "cannot parse integer");
//! assert_eq!(model.errors[0].location, "query.size");
//! ```

#![doc(html_root_url = "https://docs.rs/plinth-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bind;
pub mod coerce;
mod context;
pub mod descriptor;
mod detail;
mod error;
mod params;
pub mod response;
pub mod schema;
mod sink;
pub mod walk;

pub use bind::{
    BindOptions, Binder, Bound, Input, BODY_REQUIRED, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_MAX_WALK_DEPTH, SEQUENCE_SCHEMA_ERROR,
};
pub use coerce::{FromParam, ParamValue, RawParam, ScalarParam};
pub use context::{BindContext, BindContextBuilder};
pub use descriptor::{
    describe, DescriptorBuilder, FieldDescriptor, FloatWidth, IntWidth, ParamKind, Source,
    TypeDescriptor,
};
pub use detail::{ErrorDetail, ErrorModel, ERROR_MODEL_DETAIL, ERROR_MODEL_STATUS, ERROR_MODEL_TITLE};
pub use error::{BindRejection, DescriptorError};
pub use params::PathParams;
pub use schema::{JsonSchemaValidator, SchemaValidator, Violation};
pub use sink::ErrorSink;
pub use walk::{Resolve, ResolveScope, Walk, Walker};

