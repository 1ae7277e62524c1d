//! Test request building.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use plinth_bind::{BindContext, PathParams};
use serde::Serialize;

/// An in-memory request, ready to be turned into a [`BindContext`].
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
    /// Segments a router would have extracted
    pub path_params: PathParams,
}

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a new POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a new PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Creates a new PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Creates a new DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Converts this request into the context the engine binds from.
    pub fn into_context(self) -> BindContext {
        BindContext::new(
            self.method,
            self.uri,
            self.headers,
            self.body,
            self.path_params,
        )
    }
}

/// Builder for [`TestRequest`].
///
/// Query parameters added with [`query`](Self::query) or
/// [`flag`](Self::flag) are appended to whatever query the URI already has.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    query: Vec<String>,
    headers: HeaderMap,
    body: Option<Bytes>,
    path_params: PathParams,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            path_params: PathParams::new(),
        }
    }

    /// Appends a URL-encoded `key=value` pair.
    pub fn query(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let pair = serde_urlencoded::to_string([(key.as_ref(), value.as_ref())])
            .expect("string pairs always encode");
        self.query.push(pair);
        self
    }

    /// Appends a bare key with no `=`, as in `?verbose`.
    pub fn flag(mut self, key: impl AsRef<str>) -> Self {
        let encoded = serde_urlencoded::to_string([(key.as_ref(), "")])
            .expect("string pairs always encode");
        self.query
            .push(encoded.trim_end_matches('=').to_string());
        self
    }

    /// Sets a header on the request.
    ///
    /// # Panics
    ///
    /// Panics if the name or value is not a valid header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref()).expect("valid header name");
        let value = HeaderValue::try_from(value.as_ref()).expect("valid header value");
        self.headers.insert(name, value);
        self
    }

    /// Sets the `Host` header, which determines the `$schema` link.
    pub fn host(self, host: impl AsRef<str>) -> Self {
        self.header(header::HOST.as_str(), host)
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Adds a path segment as a router would have extracted it.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON and the matching Content-Type.
    ///
    /// # Panics
    ///
    /// Panics if `value` cannot be serialized.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        let bytes = serde_json::to_vec(value).expect("JSON serialization should succeed");
        self.body = Some(Bytes::from(bytes));
        self.content_type("application/json")
    }

    /// Builds the test request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        let mut uri = self.uri;
        if !self.query.is_empty() {
            uri.push(if uri.contains('?') { '&' } else { '?' });
            uri.push_str(&self.query.join("&"));
        }

        let uri: Uri = uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("Invalid URI: {e}")))?;

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
            path_params: self.path_params,
        })
    }

    /// Builds straight into a [`BindContext`].
    ///
    /// # Panics
    ///
    /// Panics if the URI is invalid.
    pub fn context(self) -> BindContext {
        self.build().expect("valid test request").into_context()
    }
}
