//! Error details and the aggregated error response body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title used for every aggregated input error.
pub const ERROR_MODEL_TITLE: &str = "Unprocessable Entity";

/// Detail line used for every aggregated input error.
pub const ERROR_MODEL_DETAIL: &str = "Error while processing input parameters";

/// Status carried by every aggregated input error.
pub const ERROR_MODEL_STATUS: u16 = 422;

/// One problem found while binding a request.
///
/// `location` is a dotted/bracketed path rooted at `query`, `header`, `path`
/// or `body` (for example `query.int`, `query[2].tags`, `body.foo.a[0].one`).
/// `value` is the original input: the raw text for parameters, the decoded
/// JSON value for body violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable description of the problem.
    pub message: String,
    /// Where in the request the problem was found.
    pub location: String,
    /// The offending input value.
    pub value: Value,
}

impl ErrorDetail {
    /// Creates a detail.
    ///
    /// # Example
    ///
    /// ```rust
    /// use plinth_bind::ErrorDetail;
    ///
    /// let detail = ErrorDetail::new("cannot parse integer", "query.int", "bad");
    /// assert_eq!(detail.value, serde_json::json!("bad"));
    /// ```
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        location: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
            value: value.into(),
        }
    }
}

/// Structured body returned when one or more input errors were recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorModel {
    /// Link to the schema describing this document.
    #[serde(rename = "$schema")]
    pub schema: String,
    /// Short summary, always [`ERROR_MODEL_TITLE`].
    pub title: String,
    /// HTTP status code, always 422.
    pub status: u16,
    /// Longer explanation, always [`ERROR_MODEL_DETAIL`].
    pub detail: String,
    /// Every recorded problem, in the order it was found.
    pub errors: Vec<ErrorDetail>,
}

impl ErrorModel {
    /// Builds the model for a request addressed to `host`.
    #[must_use]
    pub fn new(host: &str, errors: Vec<ErrorDetail>) -> Self {
        Self {
            schema: schema_link(host),
            title: ERROR_MODEL_TITLE.to_string(),
            status: ERROR_MODEL_STATUS,
            detail: ERROR_MODEL_DETAIL.to_string(),
            errors,
        }
    }
}

fn schema_link(host: &str) -> String {
    format!("https://{host}/schemas/ErrorModel.json")
}
