//! Constraint checking against JSON-Schema style constraint sets.
//!
//! The engine only needs "give me every violation of this schema by this
//! value"; [`SchemaValidator`] is that seam. [`JsonSchemaValidator`] is the
//! default implementation, backed by the `jsonschema` crate with compiled
//! validators cached by schema text.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One constraint violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Validator-supplied description.
    pub message: String,
    /// JSON pointer to the offending value within the instance.
    pub instance_path: String,
}

/// Checks values against constraint sets.
///
/// Implementations must be cheap to call concurrently; the binder shares one
/// validator across all requests.
pub trait SchemaValidator: Send + Sync {
    /// Returns every violation of `schema` by `instance`, in a stable order.
    fn validate(&self, instance: &Value, schema: &Value) -> Vec<Violation>;
}

/// [`SchemaValidator`] backed by the `jsonschema` crate.
#[derive(Default)]
pub struct JsonSchemaValidator {
    compiled: RwLock<HashMap<String, Arc<jsonschema::Validator>>>,
}

impl std::fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("compiled", &self.compiled.read().len())
            .finish()
    }
}

impl JsonSchemaValidator {
    /// Creates a validator with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn compiled(&self, schema: &Value) -> Result<Arc<jsonschema::Validator>, String> {
        let key = schema.to_string();
        if let Some(validator) = self.compiled.read().get(&key) {
            return Ok(Arc::clone(validator));
        }

        let validator = Arc::new(jsonschema::validator_for(schema).map_err(|e| e.to_string())?);
        self.compiled
            .write()
            .entry(key)
            .or_insert_with(|| Arc::clone(&validator));
        Ok(validator)
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, instance: &Value, schema: &Value) -> Vec<Violation> {
        let validator = match self.compiled(schema) {
            Ok(validator) => validator,
            Err(reason) => {
                tracing::error!(error = %reason, "Constraint schema failed to compile");
                return vec![Violation {
                    message: format!("invalid constraint schema: {reason}"),
                    instance_path: String::new(),
                }];
            }
        };

        validator
            .iter_errors(instance)
            .map(|e| Violation {
                message: e.to_string(),
                instance_path: e.instance_path.to_string(),
            })
            .collect()
    }
}

/// Renders a JSON pointer as an error location under `root`.
///
/// Object keys become `.key` and array indices become `[i]`, so
/// `/foo/a/0/one` under `body` renders as `body.foo.a[0].one`.
///
/// # Example
///
/// ```rust
/// use plinth_bind::schema::pointer_location;
/// use serde_json::json;
///
/// let instance = json!({"foo": {"a": [{"one": "1"}]}});
/// assert_eq!(
///     pointer_location("body", "/foo/a/0/one", &instance),
///     "body.foo.a[0].one"
/// );
/// ```
#[must_use]
pub fn pointer_location(root: &str, pointer: &str, instance: &Value) -> String {
    let mut location = root.to_string();
    let mut current = Some(instance);

    for token in pointer.split('/').skip(1) {
        let segment = token.replace("~1", "/").replace("~0", "~");
        match current {
            Some(Value::Array(items)) => {
                location.push('[');
                location.push_str(&segment);
                location.push(']');
                current = segment.parse::<usize>().ok().and_then(|i| items.get(i));
            }
            Some(Value::Object(map)) => {
                push_key(&mut location, &segment);
                current = map.get(&segment);
            }
            _ => {
                push_key(&mut location, &segment);
                current = None;
            }
        }
    }
    location
}

fn push_key(location: &mut String, key: &str) {
    if !location.is_empty() {
        location.push('.');
    }
    location.push_str(key);
}
