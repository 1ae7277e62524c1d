//! # Plinth Test
//!
//! In-memory helpers for exercising the binding engine without a server:
//! [`TestRequest`] builds the [`BindContext`](plinth_bind::BindContext) a
//! router would hand over, and [`TestResponse`] wraps a rendered response
//! with assertion helpers.
//!
//! ## Example
//!
//! ```rust
//! use plinth_bind::{Binder, ErrorDetail};
//! use plinth_macros::Input;
//! use plinth_test::{TestRequest, TestResponse};
//!
//! #[derive(Input)]
//! struct Page {
//!     #[input(query = "size")]
//!     size: u32,
//! }
//!
//! let ctx = TestRequest::get("/items").query("size", "big").context();
//! let response = TestResponse::from(
//!     Binder::default().handle::<Page, _>(&ctx, |_| unreachable!()),
//! );
//!
//! response.assert_errors(&[ErrorDetail::new("cannot parse integer", "query.size", "big")]);
//! ```

#![doc(html_root_url = "https://docs.rs/plinth-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod request;
mod response;

pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
