//! Compiled descriptions of target shapes.
//!
//! A [`TypeDescriptor`] lists every field of an input shape together with the
//! request source it binds from, its semantic type and its constraints. It is
//! built once per shape (keyed by [`TypeId`]) and cached for the lifetime of
//! the process.
//!
//! Descriptors are normally produced by `#[derive(Input)]`; hand-written
//! shapes use [`TypeDescriptor::builder`].

use crate::{DescriptorError, Input};
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Query string parameter.
    Query,
    /// Request header.
    Header,
    /// Path template segment.
    Path,
    /// Decoded JSON body.
    Body,
    /// Untouched body bytes.
    RawBody,
}

impl Source {
    /// Returns the location root used in error paths.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Header => "header",
            Self::Path => "path",
            Self::Body | Self::RawBody => "body",
        }
    }

    /// Returns true for the textual parameter sources.
    #[must_use]
    pub fn is_param(&self) -> bool {
        matches!(self, Self::Query | Self::Header | Self::Path)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width and signedness of an integer parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
}

/// Width of a floating point parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FloatWidth {
    F32,
    F64,
}

/// Semantic type a textual parameter is coerced into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// `true`/`false`, with bare-key shorthand for `true`.
    Bool,
    /// Base-10 signed or unsigned integer.
    Int(IntWidth),
    /// Decimal floating point.
    Float(FloatWidth),
    /// Timestamp in the declared format.
    Time,
    /// Text, taken verbatim.
    String,
    /// Comma-separated sequence of a scalar kind.
    List(Box<ParamKind>),
}

impl ParamKind {
    /// Returns the JSON Schema `type` keyword for this kind.
    #[must_use]
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::Time | Self::String => "string",
            Self::List(_) => "array",
        }
    }

    /// Returns the element kind of a sequence.
    #[must_use]
    pub fn element(&self) -> Option<&ParamKind> {
        match self {
            Self::List(elem) => Some(elem),
            _ => None,
        }
    }
}

/// One field of an input shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: &'static str,
    source: Source,
    key: String,
    kind: Option<ParamKind>,
    constraints: Option<Value>,
    time_format: Option<String>,
    nested: bool,
    validation_schema: Option<Value>,
}

impl FieldDescriptor {
    /// Describes a textual parameter read from `source` under `key`.
    #[must_use]
    pub fn param(
        name: &'static str,
        source: Source,
        key: impl Into<String>,
        kind: ParamKind,
    ) -> Self {
        Self {
            name,
            source,
            key: key.into(),
            kind: Some(kind),
            constraints: None,
            time_format: None,
            nested: false,
            validation_schema: None,
        }
    }

    /// Describes the field receiving the decoded JSON body.
    #[must_use]
    pub fn body(name: &'static str) -> Self {
        Self {
            name,
            source: Source::Body,
            key: Source::Body.as_str().to_string(),
            kind: None,
            constraints: None,
            time_format: None,
            nested: true,
            validation_schema: None,
        }
    }

    /// Describes the field receiving the raw body bytes.
    #[must_use]
    pub fn raw_body(name: &'static str) -> Self {
        Self {
            name,
            source: Source::RawBody,
            key: Source::Body.as_str().to_string(),
            kind: None,
            constraints: None,
            time_format: None,
            nested: false,
            validation_schema: None,
        }
    }

    /// Attaches a JSON-Schema style constraint set.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Value) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Declares the strftime format used to parse timestamps.
    #[must_use]
    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = Some(format.into());
        self
    }

    /// Returns the Rust field name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the request source.
    #[must_use]
    pub fn source(&self) -> Source {
        self.source
    }

    /// Returns the key looked up in the source.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the semantic type of a parameter field.
    #[must_use]
    pub fn kind(&self) -> Option<&ParamKind> {
        self.kind.as_ref()
    }

    /// Returns the declared constraint set.
    #[must_use]
    pub fn constraints(&self) -> Option<&Value> {
        self.constraints.as_ref()
    }

    /// Returns the declared time format.
    #[must_use]
    pub fn time_format(&self) -> Option<&str> {
        self.time_format.as_deref()
    }

    /// Returns true if the field is a nested shape (the body).
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    /// Returns the schema the field's value is checked against, if any.
    ///
    /// Sequences always carry one (item type plus declared constraints);
    /// other fields only when constraints were declared.
    #[must_use]
    pub fn validation_schema(&self) -> Option<&Value> {
        self.validation_schema.as_ref()
    }

    /// Returns the error location of the whole field, e.g. `query.limit`.
    #[must_use]
    pub fn location(&self) -> String {
        match self.source {
            Source::Body | Source::RawBody => self.source.as_str().to_string(),
            _ => format!("{}.{}", self.source, self.key),
        }
    }

    /// Returns the error location of one sequence element, e.g. `query[2].tags`.
    #[must_use]
    pub fn element_location(&self, index: usize) -> String {
        format!("{}[{index}].{}", self.source, self.key)
    }

    fn compile_schema(&mut self) {
        let base = match &self.kind {
            Some(ParamKind::List(elem)) => Some(json!({
                "type": "array",
                "items": { "type": elem.json_type() },
            })),
            _ => None,
        };
        self.validation_schema = match (base, self.constraints.clone()) {
            (Some(Value::Object(mut base)), Some(Value::Object(extra))) => {
                merge_into(&mut base, extra);
                Some(Value::Object(base))
            }
            (base, None) => base,
            (_, constraints) => constraints,
        };
    }
}

fn merge_into(base: &mut Map<String, Value>, extra: Map<String, Value>) {
    for (key, value) in extra {
        base.insert(key, value);
    }
}

/// Compiled description of an input shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    shape: &'static str,
    fields: Vec<FieldDescriptor>,
    body: Option<usize>,
    raw_body: Option<usize>,
}

impl TypeDescriptor {
    /// Starts describing the shape named `shape`.
    #[must_use]
    pub fn builder(shape: &'static str) -> DescriptorBuilder {
        DescriptorBuilder {
            shape,
            fields: Vec::new(),
        }
    }

    /// Returns the shape's type name.
    #[must_use]
    pub fn shape(&self) -> &'static str {
        self.shape
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the body field, if declared.
    #[must_use]
    pub fn body_field(&self) -> Option<&FieldDescriptor> {
        self.body.map(|i| &self.fields[i])
    }

    /// Returns the raw-body field, if declared.
    #[must_use]
    pub fn raw_body_field(&self) -> Option<&FieldDescriptor> {
        self.raw_body.map(|i| &self.fields[i])
    }

    /// Returns true if the body must be read at all.
    #[must_use]
    pub fn reads_body(&self) -> bool {
        self.body.is_some() || self.raw_body.is_some()
    }
}

/// Accumulates fields and validates the finished shape.
#[derive(Debug)]
pub struct DescriptorBuilder {
    shape: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl DescriptorBuilder {
    /// Appends a field. Declaration order is binding order.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates and finishes the descriptor.
    pub fn build(self) -> Result<TypeDescriptor, DescriptorError> {
        let shape = self.shape;
        let mut body: Option<(usize, &'static str)> = None;
        let mut raw_body: Option<(usize, &'static str)> = None;
        let mut seen: HashSet<(Source, String)> = HashSet::new();
        let mut fields = self.fields;

        for (index, field) in fields.iter_mut().enumerate() {
            match field.source {
                Source::Body => {
                    if let Some((_, first)) = body {
                        return Err(DescriptorError::DuplicateBody {
                            shape,
                            first: first.to_string(),
                            second: field.name.to_string(),
                        });
                    }
                    body = Some((index, field.name));
                }
                Source::RawBody => {
                    if let Some((_, first)) = raw_body {
                        return Err(DescriptorError::DuplicateRawBody {
                            shape,
                            first: first.to_string(),
                            second: field.name.to_string(),
                        });
                    }
                    raw_body = Some((index, field.name));
                }
                source => {
                    // Header names are case-insensitive on the wire.
                    let key = if source == Source::Header {
                        field.key.to_ascii_lowercase()
                    } else {
                        field.key.clone()
                    };
                    if !seen.insert((source, key)) {
                        return Err(DescriptorError::DuplicateKey {
                            shape,
                            source_name: source.as_str(),
                            key: field.key.clone(),
                        });
                    }
                }
            }
            field.compile_schema();
        }

        Ok(TypeDescriptor {
            shape,
            fields,
            body: body.map(|(i, _)| i),
            raw_body: raw_body.map(|(i, _)| i),
        })
    }
}

type DescriptorCache = RwLock<HashMap<TypeId, &'static TypeDescriptor>>;

/// Process-wide descriptor cache. Entries are leaked; they live
/// as long as the process and are immutable once published.
fn cache() -> &'static DescriptorCache {
    static CACHE: OnceLock<DescriptorCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the cached descriptor for `T`, building it on first use.
///
/// Concurrent first calls for the same shape publish exactly one descriptor;
/// a shape that fails to describe is never cached.
///
/// # Example
///
/// ```rust
/// use plinth_bind::{describe, FieldDescriptor, Input, ParamKind, Source, TypeDescriptor};
/// use plinth_bind::{Bound, DescriptorError, Walk, Walker};
///
/// struct Paging {
///     limit: i32,
/// }
///
/// impl Walk for Paging {
///     fn walk_children(&self, _walker: &mut Walker<'_>) {}
/// }
///
/// impl Input for Paging {
///     fn describe() -> Result<TypeDescriptor, DescriptorError> {
///         TypeDescriptor::builder("Paging")
///             .field(FieldDescriptor::param("limit", Source::Query, "limit", ParamKind::Int(plinth_bind::IntWidth::I32)))
///             .build()
///     }
///
///     fn assemble(bound: &mut Bound<'_>) -> Option<Self> {
///         Some(Self { limit: bound.param(0) })
///     }
/// }
///
/// let first = describe::<Paging>().unwrap();
/// let second = describe::<Paging>().unwrap();
/// assert!(std::ptr::eq(first, second));
/// assert_eq!(first.fields()[0].location(), "query.limit");
/// ```
pub fn describe<T: Input>() -> Result<&'static TypeDescriptor, DescriptorError> {
    let id = TypeId::of::<T>();
    if let Some(descriptor) = cache().read().get(&id) {
        return Ok(descriptor);
    }

    let mut guard = cache().write();
    if let Some(descriptor) = guard.get(&id) {
        return Ok(descriptor);
    }
    let descriptor: &'static TypeDescriptor = Box::leak(Box::new(T::describe()?));
    tracing::debug!(
        shape = descriptor.shape(),
        fields = descriptor.fields().len(),
        "Compiled input descriptor"
    );
    guard.insert(id, descriptor);
    Ok(descriptor)
}
