//! Response rendering for handlers and binding rejections.
//!
//! | Builder | Content-Type |
//! |---------|--------------|
//! | [`JsonResponse`] | `application/json` |
//! | [`TextResponse`] | `text/plain; charset=utf-8` |
//! | [`NoContent`] | none |
//! | [`BindRejection::into_response`] | `application/problem+json` (422) or `text/plain` |

use crate::BindRejection;
use bytes::Bytes;
use http::{header, Response, StatusCode};
use serde::Serialize;

/// Content type of the aggregated error body.
pub const PROBLEM_JSON: &str = "application/problem+json";

/// JSON response builder.
///
/// # Example
///
/// ```rust
/// use plinth_bind::response::JsonResponse;
///
/// let response = JsonResponse::new(serde_json::json!({"ok": true})).into_response();
/// assert_eq!(response.status(), http::StatusCode::OK);
/// ```
#[derive(Debug)]
pub struct JsonResponse<T> {
    data: T,
    status: StatusCode,
}

impl<T: Serialize> JsonResponse<T> {
    /// Creates a JSON response with status 200 OK.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
        }
    }

    /// Sets a custom status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Builds the HTTP response.
    ///
    /// # Panics
    ///
    /// Panics if JSON serialization fails.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let body = serde_json::to_vec(&self.data).expect("JSON serialization failed");
        build(self.status, Some("application/json"), Bytes::from(body))
    }
}

/// Plain text response builder.
#[derive(Debug, Clone)]
pub struct TextResponse {
    body: Bytes,
    status: StatusCode,
}

impl TextResponse {
    /// Creates a text response with status 200 OK.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            status: StatusCode::OK,
        }
    }

    /// Sets a custom status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Builds the HTTP response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        build(self.status, Some("text/plain; charset=utf-8"), self.body)
    }
}

/// 204 No Content.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

impl NoContent {
    /// Builds the HTTP response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        build(StatusCode::NO_CONTENT, None, Bytes::new())
    }
}

impl BindRejection {
    /// Renders the rejection.
    ///
    /// Only 422 carries the structured error model; the other statuses get a
    /// one-line text body.
    ///
    /// # Panics
    ///
    /// Panics if the error model cannot be serialized.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let status = self.status_code();
        match self {
            Self::Unprocessable(model) => {
                let body = serde_json::to_vec(&model).expect("JSON serialization failed");
                build(status, Some(PROBLEM_JSON), Bytes::from(body))
            }
            other => build(
                status,
                Some("text/plain; charset=utf-8"),
                Bytes::from(other.to_string()),
            ),
        }
    }
}

fn build(status: StatusCode, content_type: Option<&str>, body: Bytes) -> Response<Bytes> {
    let mut builder = Response::builder().status(status);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).expect("Failed to build response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorDetail, ErrorModel};

    #[test]
    fn test_unprocessable_renders_problem_json() {
        let model = ErrorModel::new(
            "example.com",
            vec![ErrorDetail::new("cannot parse integer", "query.int", "bad")],
        );
        let response = BindRejection::Unprocessable(model).into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()[header::CONTENT_TYPE], PROBLEM_JSON);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["status"], 422);
        assert_eq!(body["errors"][0]["location"], "query.int");
    }

    #[test]
    fn test_malformed_body_is_plain_text() {
        let response = BindRejection::malformed_body("expected value").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert!(serde_json::from_slice::<ErrorModel>(response.body()).is_err());
    }

    #[test]
    fn test_no_content() {
        let response = NoContent.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_json_with_status() {
        let response = JsonResponse::new(vec![1, 2])
            .with_status(StatusCode::CREATED)
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(&response.body()[..], b"[1,2]");
    }
}
