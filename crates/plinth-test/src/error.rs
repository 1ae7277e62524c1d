//! Test utility errors.

use thiserror::Error;

/// Errors raised while building requests or reading responses.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be assembled.
    #[error("failed to build request: {0}")]
    RequestBuild(String),

    /// The response body could not be read as text.
    #[error("failed to read body: {0}")]
    BodyRead(String),

    /// The response body is not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
