//! Request context consumed by the binding engine.
//!
//! [`BindContext`] carries every input source the engine reads: the query
//! string, headers, extracted path segments, the raw body and the host used
//! to build `$schema` links in error responses.

use crate::PathParams;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};

/// Host used when neither the `Host` header nor the URI carries one.
const FALLBACK_HOST: &str = "localhost";

/// Everything the engine needs to know about one incoming request.
///
/// A context is owned by the task handling the request and is never shared
/// across requests.
///
/// # Example
///
/// ```rust
/// use plinth_bind::{BindContext, PathParams};
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut params = PathParams::new();
/// params.push("id", "7");
///
/// let ctx = BindContext::new(
///     Method::GET,
///     Uri::from_static("http://example.com/things/7?verbose"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.host(), "example.com");
/// assert_eq!(ctx.query_pairs(), vec![("verbose".to_string(), String::new())]);
/// ```
#[derive(Debug, Clone)]
pub struct BindContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
}

impl BindContext {
    /// Creates a new context.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: PathParams,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the raw query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Decodes the query string into ordered key/value pairs.
    ///
    /// A key written without `=` decodes to an empty value, exactly like
    /// `key=`. A query string that cannot be decoded yields no pairs.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let Some(query) = self.query_string() else {
            return Vec::new();
        };
        match serde_urlencoded::from_str(query) {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::debug!(error = %e, "Undecodable query string ignored");
                Vec::new()
            }
        }
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the extracted path segments.
    #[must_use]
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// Returns the host the request was addressed to.
    ///
    /// Prefers the `Host` header, then the URI authority.
    #[must_use]
    pub fn host(&self) -> String {
        if let Some(host) = self.header("host") {
            return host.to_string();
        }
        self.uri
            .authority()
            .map_or_else(|| FALLBACK_HOST.to_string(), |a| a.as_str().to_string())
    }
}

/// Builder for constructing a [`BindContext`].
#[derive(Debug, Default)]
pub struct BindContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
}

impl BindContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a single header. Invalid names and values are ignored.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        if let (Ok(name), Ok(value)) = (name, value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a single path segment.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Builds the context. Defaults to `GET /` when unset.
    #[must_use]
    pub fn build(self) -> BindContext {
        BindContext {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: self.body,
            path_params: self.path_params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_flag_and_empty() {
        let ctx = BindContextBuilder::new()
            .uri(Uri::from_static("/?s=&b&n=1"))
            .build();

        assert_eq!(
            ctx.query_pairs(),
            vec![
                ("s".to_string(), String::new()),
                ("b".to_string(), String::new()),
                ("n".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_decoding() {
        let ctx = BindContextBuilder::new()
            .uri(Uri::from_static("/?q=rust%2Blang&x=a+b"))
            .build();

        let pairs = ctx.query_pairs();
        assert_eq!(pairs[0].1, "rust+lang");
        assert_eq!(pairs[1].1, "a b");
    }

    #[test]
    fn test_no_query() {
        let ctx = BindContextBuilder::new().build();
        assert!(ctx.query_pairs().is_empty());
        assert_eq!(ctx.query_string(), None);
    }

    #[test]
    fn test_builder_header_names() {
        let name = format!("X-{}", "Tenant");
        let ctx = BindContextBuilder::new()
            .header(&name, "acme")
            .header("bad name", "ignored")
            .header("x-broken", "line\nbreak")
            .build();

        assert_eq!(ctx.header("x-tenant"), Some("acme"));
        assert_eq!(ctx.headers().len(), 1);
    }

    #[test]
    fn test_host_prefers_header() {
        let ctx = BindContextBuilder::new()
            .uri(Uri::from_static("http://internal:8080/"))
            .header("host", "example.com")
            .build();

        assert_eq!(ctx.host(), "example.com");
    }

    #[test]
    fn test_host_from_authority_and_fallback() {
        let ctx = BindContextBuilder::new()
            .uri(Uri::from_static("http://internal:8080/"))
            .build();
        assert_eq!(ctx.host(), "internal:8080");

        let ctx = BindContextBuilder::new().build();
        assert_eq!(ctx.host(), "localhost");
    }

    #[test]
    fn test_builder_parts() {
        let ctx = BindContextBuilder::new()
            .method(Method::POST)
            .body(r#"{"a":1}"#)
            .path_param("id", "9")
            .build();

        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.body().as_ref(), br#"{"a":1}"#);
        assert_eq!(ctx.path_params().get("id"), Some("9"));
    }
}
