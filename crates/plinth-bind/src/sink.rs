//! Per-request error aggregation.

use crate::{ErrorDetail, ErrorModel};

/// Ordered collection of every problem found while binding one request.
///
/// Stages append in the order they run: parameters in declaration order,
/// then the body, then resolvers in traversal order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ErrorSink {
    errors: Vec<ErrorDetail>,
}

impl ErrorSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a problem.
    pub fn add_error(&mut self, detail: ErrorDetail) {
        self.errors.push(detail);
    }

    /// Returns the number of recorded problems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the recorded problems.
    #[must_use]
    pub fn errors(&self) -> &[ErrorDetail] {
        &self.errors
    }

    /// Produces the error body, or `None` when the request is clean.
    #[must_use]
    pub fn finalize(self, host: &str) -> Option<ErrorModel> {
        if self.errors.is_empty() {
            None
        } else {
            Some(ErrorModel::new(host, self.errors))
        }
    }
}
