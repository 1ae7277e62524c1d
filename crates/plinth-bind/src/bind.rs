//! The binding pipeline.
//!
//! [`Binder::bind`] runs the stages in a fixed order for one request:
//!
//! 1. look up the cached [`TypeDescriptor`] for the target shape
//! 2. coerce every parameter field (query, header, path) in declaration order
//! 3. read, parse and constraint-check the body, capturing the raw bytes
//! 4. assemble the typed value via [`Input::assemble`]
//! 5. walk the value, invoking resolvers
//! 6. finalize: a clean sink yields the value, anything else a [`BindRejection`]
//!
//! Stages 2 to 5 never stop at the first problem; everything they find is
//! reported together in one [`ErrorModel`](crate::ErrorModel). A body that
//! is valid JSON but does not fit the body type is one more input error, at
//! the location where deserialization gave up. Only an oversized body, bytes
//! that are not JSON, a shape that cannot describe itself and runaway
//! nesting end the request early.

use crate::coerce::{coerce, list_json_text, FromParam, ParamValue, RawParam};
use crate::descriptor::{describe, FieldDescriptor, ParamKind, Source, TypeDescriptor};
use crate::schema::{pointer_location, JsonSchemaValidator, SchemaValidator};
use crate::walk::{Walk, Walker};
use crate::{BindContext, BindRejection, DescriptorError, ErrorDetail, ErrorSink};
use bytes::Bytes;
use http::Response;
use serde::de::DeserializeOwned;
use serde_path_to_error::Segment;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Default maximum body size (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default bound on resolver traversal depth.
pub const DEFAULT_MAX_WALK_DEPTH: usize = 64;

/// Message recorded when a required body is missing.
pub const BODY_REQUIRED: &str = "request body is required";

/// Prefix of the whole-field sequence check failure message.
pub const SEQUENCE_SCHEMA_ERROR: &str = "unable to validate against schema";

/// A shape the engine can bind a request into.
///
/// Normally derived with `#[derive(Input)]`. [`Input::describe`] lists the
/// fields; [`Input::assemble`] builds the value from the per-field results,
/// taking slot `i` for the `i`-th described field.
pub trait Input: Walk + Sized + 'static {
    /// Describes the shape's fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape declares an impossible configuration.
    fn describe() -> Result<TypeDescriptor, DescriptorError>;

    /// Builds the value from bound slots.
    ///
    /// Returns `None` only when the body could not be deserialized, which
    /// [`Bound::body`] has already recorded as an error.
    fn assemble(bound: &mut Bound<'_>) -> Option<Self>;
}

/// Tunables for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOptions {
    /// Bodies larger than this are rejected with 413.
    pub max_body_bytes: usize,
    /// Locations with more segments than this during the resolver walk are
    /// an internal error. `Option`, `Box`, `Arc` and `Rc` add no segment.
    pub max_walk_depth: usize,
    /// strftime format for timestamp parameters that declare none.
    /// RFC 3339 when unset.
    pub time_format: Option<String>,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_walk_depth: DEFAULT_MAX_WALK_DEPTH,
            time_format: None,
        }
    }
}

#[derive(Debug)]
enum Slot {
    Empty,
    Param(ParamValue),
    Body(Value),
    Raw(Bytes),
}

/// Per-field results handed to [`Input::assemble`].
#[derive(Debug)]
pub struct Bound<'a> {
    slots: Vec<Slot>,
    sink: &'a mut ErrorSink,
    body_violations: usize,
}

impl Bound<'_> {
    fn take(&mut self, index: usize) -> Slot {
        self.slots
            .get_mut(index)
            .map_or(Slot::Empty, |slot| std::mem::replace(slot, Slot::Empty))
    }

    /// Takes parameter slot `index`.
    ///
    /// Absent and unparseable parameters yield `T::default()`; the latter
    /// have already been recorded as errors.
    pub fn param<T: FromParam>(&mut self, index: usize) -> T {
        match self.take(index) {
            Slot::Param(value) => T::from_value(value).unwrap_or_default(),
            _ => T::default(),
        }
    }

    /// Takes body slot `index`, deserialized into `T`.
    ///
    /// An empty body deserializes from JSON `null`, so optional bodies bind
    /// as `None`; for anything else a "request body is required" error is
    /// recorded at `body`.
    ///
    /// A body that does not fit `T` records the deserializer's message at
    /// the offending location, with the decoded value found there. When the
    /// constraint pass already reported the body, that report stands alone.
    pub fn body<T: DeserializeOwned>(&mut self, index: usize) -> Option<T> {
        match self.take(index) {
            Slot::Body(value) => match serde_path_to_error::deserialize(&value) {
                Ok(body) => Some(body),
                Err(e) => {
                    if self.body_violations == 0 {
                        let pointer = json_pointer(e.path());
                        let actual = value.pointer(&pointer).cloned().unwrap_or(Value::Null);
                        let location = pointer_location("body", &pointer, &value);
                        self.sink
                            .add_error(ErrorDetail::new(e.inner().to_string(), location, actual));
                    }
                    None
                }
            },
            _ => match serde_json::from_value(Value::Null) {
                Ok(body) => Some(body),
                Err(_) => {
                    self.sink
                        .add_error(ErrorDetail::new(BODY_REQUIRED, "body", Value::Null));
                    None
                }
            },
        }
    }

    /// Takes raw-body slot `index`.
    pub fn raw_body<T: From<Bytes>>(&mut self, index: usize) -> T {
        match self.take(index) {
            Slot::Raw(bytes) => T::from(bytes),
            _ => T::from(Bytes::new()),
        }
    }
}

/// Binds requests into [`Input`] shapes.
///
/// A binder is cheap to clone and safe to share across tasks.
///
/// # Example
///
/// ```rust
/// use plinth_bind::{BindContextBuilder, Binder, Bound, DescriptorError};
/// use plinth_bind::{FieldDescriptor, Input, ParamKind, Source, TypeDescriptor, Walk, Walker};
///
/// #[derive(Debug)]
/// struct Search {
///     q: String,
///     verbose: bool,
/// }
///
/// impl Walk for Search {
///     fn walk_children(&self, _walker: &mut Walker<'_>) {}
/// }
///
/// impl Input for Search {
///     fn describe() -> Result<TypeDescriptor, DescriptorError> {
///         TypeDescriptor::builder("Search")
///             .field(FieldDescriptor::param("q", Source::Query, "q", ParamKind::String))
///             .field(FieldDescriptor::param("verbose", Source::Query, "verbose", ParamKind::Bool))
///             .build()
///     }
///
///     fn assemble(bound: &mut Bound<'_>) -> Option<Self> {
///         Some(Self { q: bound.param(0), verbose: bound.param(1) })
///     }
/// }
///
/// let ctx = BindContextBuilder::new()
///     .uri("/search?q=rust&verbose".parse().unwrap())
///     .build();
///
/// let search: Search = Binder::default().bind(&ctx).unwrap();
/// assert_eq!(search.q, "rust");
/// assert!(search.verbose);
/// ```
#[derive(Clone)]
pub struct Binder {
    options: BindOptions,
    validator: Arc<dyn SchemaValidator>,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new(BindOptions::default())
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Binder {
    /// Creates a binder using the default constraint validator.
    #[must_use]
    pub fn new(options: BindOptions) -> Self {
        Self {
            options,
            validator: Arc::new(JsonSchemaValidator::new()),
        }
    }

    /// Replaces the constraint validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    /// Describes `T` ahead of the first request.
    ///
    /// # Errors
    ///
    /// Returns the shape's [`DescriptorError`] so applications can refuse to
    /// start instead of failing requests.
    pub fn register<T: Input>(&self) -> Result<&'static TypeDescriptor, DescriptorError> {
        let descriptor = describe::<T>()?;
        tracing::info!(
            shape = descriptor.shape(),
            fields = descriptor.fields().len(),
            "Registered input shape"
        );
        Ok(descriptor)
    }

    /// Binds the request into `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`BindRejection`] describing why the request cannot be
    /// handled. Input errors are aggregated into
    /// [`BindRejection::Unprocessable`].
    pub fn bind<T: Input>(&self, ctx: &BindContext) -> Result<T, BindRejection> {
        let descriptor = describe::<T>().map_err(|e| {
            tracing::error!(error = %e, "Input shape cannot be described");
            BindRejection::internal(e.to_string())
        })?;

        let mut sink = ErrorSink::new();
        let mut slots: Vec<Slot> = std::iter::repeat_with(|| Slot::Empty)
            .take(descriptor.fields().len())
            .collect();

        let query = if descriptor
            .fields()
            .iter()
            .any(|f| f.source() == Source::Query)
        {
            ctx.query_pairs()
        } else {
            Vec::new()
        };

        for (slot, field) in slots.iter_mut().zip(descriptor.fields()) {
            if field.source().is_param() {
                *slot = self.bind_param(ctx, &query, field, &mut sink);
            }
        }

        let body_violations = if descriptor.reads_body() {
            self.bind_body(ctx, descriptor, &mut slots, &mut sink)?
        } else {
            0
        };

        let mut bound = Bound {
            slots,
            sink: &mut sink,
            body_violations,
        };
        let Some(input) = T::assemble(&mut bound) else {
            if sink.is_empty() {
                tracing::error!(shape = descriptor.shape(), "Input shape failed to assemble");
                return Err(BindRejection::internal(format!(
                    "shape '{}' failed to assemble",
                    descriptor.shape()
                )));
            }
            return Err(unprocessable(ctx, descriptor, sink));
        };

        let mut walker = Walker::new(ctx, &mut sink, self.options.max_walk_depth);
        walker.visit(&input);
        match walker.finish() {
            Ok(resolved) => {
                tracing::trace!(shape = descriptor.shape(), resolved, "Resolvers ran");
            }
            Err(location) => {
                tracing::error!(
                    shape = descriptor.shape(),
                    location = %location,
                    max_depth = self.options.max_walk_depth,
                    "Input nesting exceeds walk depth"
                );
                return Err(BindRejection::internal(format!(
                    "input nesting exceeds {} levels at '{location}'",
                    self.options.max_walk_depth
                )));
            }
        }

        if sink.is_empty() {
            Ok(input)
        } else {
            Err(unprocessable(ctx, descriptor, sink))
        }
    }

    /// Binds the request and runs `handler` only if binding succeeded.
    ///
    /// Exactly one response is produced: the handler's, or the rejection's.
    pub fn handle<T, F>(&self, ctx: &BindContext, handler: F) -> Response<Bytes>
    where
        T: Input,
        F: FnOnce(T) -> Response<Bytes>,
    {
        match self.bind::<T>(ctx) {
            Ok(input) => handler(input),
            Err(rejection) => rejection.into_response(),
        }
    }

    /// Async variant of [`Binder::handle`].
    pub async fn handle_async<T, F, Fut>(&self, ctx: &BindContext, handler: F) -> Response<Bytes>
    where
        T: Input,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Response<Bytes>>,
    {
        match self.bind::<T>(ctx) {
            Ok(input) => handler(input).await,
            Err(rejection) => rejection.into_response(),
        }
    }

    fn bind_param(
        &self,
        ctx: &BindContext,
        query: &[(String, String)],
        field: &FieldDescriptor,
        sink: &mut ErrorSink,
    ) -> Slot {
        let RawParam::Present(raw) = lookup(ctx, query, field) else {
            return Slot::Empty;
        };
        let Some(kind) = field.kind() else {
            return Slot::Empty;
        };
        let time_format = field
            .time_format()
            .or(self.options.time_format.as_deref());

        let slot = match coerce(&raw, kind, time_format) {
            Ok(value) => {
                if !matches!(kind, ParamKind::List(_)) {
                    self.check_scalar(&raw, &value, field, sink);
                }
                Slot::Param(value)
            }
            Err(errors) => {
                for error in errors {
                    let location = error
                        .index
                        .map_or_else(|| field.location(), |i| field.element_location(i));
                    sink.add_error(ErrorDetail::new(error.message, location, error.raw));
                }
                Slot::Empty
            }
        };

        // Runs regardless of element failures; both kinds of error may be
        // reported for the same field.
        if let ParamKind::List(elem) = kind {
            self.check_sequence(&raw, elem, field, sink);
        }
        slot
    }

    fn check_scalar(
        &self,
        raw: &str,
        value: &ParamValue,
        field: &FieldDescriptor,
        sink: &mut ErrorSink,
    ) {
        let Some(schema) = field.validation_schema() else {
            return;
        };
        for violation in self.validator.validate(&value.to_json(), schema) {
            sink.add_error(ErrorDetail::new(violation.message, field.location(), raw));
        }
    }

    fn check_sequence(&self, raw: &str, elem: &ParamKind, field: &FieldDescriptor, sink: &mut ErrorSink) {
        let text = list_json_text(raw, elem);
        let instance: Value = match serde_json::from_str(&text) {
            Ok(instance) => instance,
            Err(e) => {
                sink.add_error(ErrorDetail::new(
                    format!("{SEQUENCE_SCHEMA_ERROR}: {e}"),
                    field.location(),
                    text,
                ));
                return;
            }
        };
        let Some(schema) = field.validation_schema() else {
            return;
        };
        for violation in self.validator.validate(&instance, schema) {
            sink.add_error(ErrorDetail::new(
                violation.message,
                field.location(),
                text.clone(),
            ));
        }
    }

    fn bind_body(
        &self,
        ctx: &BindContext,
        descriptor: &TypeDescriptor,
        slots: &mut [Slot],
        sink: &mut ErrorSink,
    ) -> Result<usize, BindRejection> {
        let body = ctx.body();
        if body.len() > self.options.max_body_bytes {
            tracing::warn!(
                shape = descriptor.shape(),
                limit = self.options.max_body_bytes,
                actual = body.len(),
                "Request body too large"
            );
            return Err(BindRejection::PayloadTooLarge {
                limit: self.options.max_body_bytes,
                actual: body.len(),
            });
        }

        let raw_index = index_of(descriptor, Source::RawBody);
        if body.is_empty() {
            if let Some(i) = raw_index {
                slots[i] = Slot::Raw(Bytes::new());
            }
            return Ok(0);
        }

        let value: Value = serde_json::from_slice(body).map_err(|e| {
            tracing::warn!(shape = descriptor.shape(), error = %e, "Malformed JSON body");
            BindRejection::malformed_body(e.to_string())
        })?;

        // Captured before the constraint pass, whatever its outcome.
        if let Some(i) = raw_index {
            slots[i] = Slot::Raw(body.clone());
        }

        let mut violations = 0;
        if let Some(i) = index_of(descriptor, Source::Body) {
            if let Some(schema) = descriptor.fields()[i].validation_schema() {
                for violation in self.validator.validate(&value, schema) {
                    violations += 1;
                    let actual = value
                        .pointer(&violation.instance_path)
                        .cloned()
                        .unwrap_or(Value::Null);
                    let location = pointer_location("body", &violation.instance_path, &value);
                    sink.add_error(ErrorDetail::new(violation.message, location, actual));
                }
            }
            slots[i] = Slot::Body(value);
        }
        Ok(violations)
    }
}

/// Renders a deserializer path as a JSON pointer into the decoded body.
fn json_pointer(path: &serde_path_to_error::Path) -> String {
    let mut pointer = String::new();
    for segment in path.iter() {
        match segment {
            Segment::Seq { index } => {
                pointer.push('/');
                pointer.push_str(&index.to_string());
            }
            Segment::Map { key } | Segment::Enum { variant: key } => {
                pointer.push('/');
                pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
            }
            Segment::Unknown => {}
        }
    }
    pointer
}

fn index_of(descriptor: &TypeDescriptor, source: Source) -> Option<usize> {
    descriptor.fields().iter().position(|f| f.source() == source)
}

/// Finds the raw text of a parameter. Repeated query keys: first wins.
fn lookup(ctx: &BindContext, query: &[(String, String)], field: &FieldDescriptor) -> RawParam {
    let value = match field.source() {
        Source::Query => query
            .iter()
            .find(|(key, _)| key == field.key())
            .map(|(_, value)| value.clone()),
        Source::Header => ctx.header(field.key()).map(str::to_string),
        Source::Path => ctx.path_params().get(field.key()).map(str::to_string),
        Source::Body | Source::RawBody => None,
    };
    value.map_or(RawParam::Absent, RawParam::Present)
}

fn unprocessable(ctx: &BindContext, descriptor: &TypeDescriptor, sink: ErrorSink) -> BindRejection {
    let error_count = sink.len();
    match sink.finalize(&ctx.host()) {
        Some(model) => {
            tracing::debug!(
                shape = descriptor.shape(),
                error_count,
                status = 422,
                "Input rejected"
            );
            BindRejection::Unprocessable(model)
        }
        None => BindRejection::internal("no input errors to report"),
    }
}
