//! Path segment storage.
//!
//! Path templates are matched outside this crate; the router hands the
//! extracted segments over as a [`PathParams`] set.

use smallvec::SmallVec;

/// Segments stored inline before spilling to the heap.
const INLINE_SEGMENTS: usize = 4;

/// Named segments extracted from a matched path template.
///
/// # Example
///
/// ```rust
/// use plinth_bind::PathParams;
///
/// let mut params = PathParams::new();
/// params.push("thing-id", "42");
///
/// assert_eq!(params.get("thing-id"), Some("42"));
/// assert_eq!(params.get("other"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParams {
    inner: SmallVec<[(String, String); INLINE_SEGMENTS]>,
}

impl PathParams {
    /// Creates an empty segment set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named segment.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the first segment registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if no segments were extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates segments in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut params = PathParams::new();
        params.push("id", "123");
        params.push("slug", "hello");

        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.get("slug"), Some("hello"));
        assert_eq!(params.get("unknown"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_first_segment_wins() {
        let mut params = PathParams::new();
        params.push("id", "1");
        params.push("id", "2");

        assert_eq!(params.get("id"), Some("1"));
    }

    #[test]
    fn test_from_iterator_spills() {
        let params: PathParams = (0..10)
            .map(|i| (format!("key{i}"), format!("value{i}")))
            .collect();

        assert_eq!(params.len(), 10);
        assert_eq!(params.get("key7"), Some("value7"));
        assert_eq!(params.iter().next(), Some(("key0", "value0")));
    }
}
