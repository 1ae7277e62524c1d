//! Binding failure types.
//!
//! A request either binds cleanly or is rejected with exactly one
//! [`BindRejection`]. Recoverable problems are aggregated into the
//! [`ErrorModel`] carried by [`BindRejection::Unprocessable`]; the remaining
//! variants short-circuit the pipeline.

use crate::ErrorModel;
use http::StatusCode;
use thiserror::Error;

/// Why a request could not be bound.
#[derive(Debug, Error)]
pub enum BindRejection {
    /// The body is not syntactically valid JSON.
    #[error("malformed request body: {reason}")]
    MalformedBody {
        /// Decoder message.
        reason: String,
    },

    /// The body exceeds the configured limit.
    #[error("payload too large: max {limit} bytes, got {actual} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        limit: usize,
        /// Actual body length in bytes.
        actual: usize,
    },

    /// One or more input errors were recorded.
    #[error("{} input error(s) recorded", .0.errors.len())]
    Unprocessable(ErrorModel),

    /// The engine itself failed (bad shape declaration, runaway nesting).
    #[error("internal binding failure: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl BindRejection {
    /// Creates a malformed-body rejection.
    #[must_use]
    pub fn malformed_body(reason: impl Into<String>) -> Self {
        Self::MalformedBody {
            reason: reason.into(),
        }
    }

    /// Creates an internal rejection.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this rejection.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedBody { .. } => "MALFORMED_BODY",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::Unprocessable(_) => "UNPROCESSABLE_ENTITY",
            Self::Internal { .. } => "BIND_FAILED",
        }
    }

    /// Returns the aggregated error model, if this is a 422 rejection.
    #[must_use]
    pub fn error_model(&self) -> Option<&ErrorModel> {
        match self {
            Self::Unprocessable(model) => Some(model),
            _ => None,
        }
    }
}

/// A target shape declares a configuration that can never bind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// More than one field captures the raw body.
    #[error("shape '{shape}' declares more than one raw-body field: '{first}' and '{second}'")]
    DuplicateRawBody {
        /// Type name of the shape.
        shape: &'static str,
        /// First raw-body field.
        first: String,
        /// Second raw-body field.
        second: String,
    },

    /// More than one field receives the decoded body.
    #[error("shape '{shape}' declares more than one body field: '{first}' and '{second}'")]
    DuplicateBody {
        /// Type name of the shape.
        shape: &'static str,
        /// First body field.
        first: String,
        /// Second body field.
        second: String,
    },

    /// Two fields read the same key from the same source.
    #[error("shape '{shape}' binds {source_name} key '{key}' more than once")]
    DuplicateKey {
        /// Type name of the shape.
        shape: &'static str,
        /// Source the key is read from.
        source_name: &'static str,
        /// The repeated key.
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            BindRejection::malformed_body("eof").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BindRejection::PayloadTooLarge {
                limit: 1,
                actual: 2
            }
            .status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            BindRejection::Unprocessable(ErrorModel::new("h", Vec::new())).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            BindRejection::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_model_only_for_unprocessable() {
        assert!(BindRejection::malformed_body("x").error_model().is_none());
        let rejection = BindRejection::Unprocessable(ErrorModel::new("h", Vec::new()));
        assert!(rejection.error_model().is_some());
        assert_eq!(rejection.error_code(), "UNPROCESSABLE_ENTITY");
    }

    #[test]
    fn test_descriptor_error_display() {
        let err = DescriptorError::DuplicateRawBody {
            shape: "Input",
            first: "raw".to_string(),
            second: "copy".to_string(),
        };
        assert!(err.to_string().contains("more than one raw-body field"));
        assert!(err.to_string().contains("copy"));
    }
}
