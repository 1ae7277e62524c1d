//! Derive macros for Plinth input shapes.
//!
//! `#[derive(Input)]` turns a struct into a bindable request shape: each
//! field names the request source it is read from, and the macro generates
//! the field descriptor list together with the code assembling the value.
//! `#[derive(Walk)]` lets nested body types take part in the resolver walk.
//!
//! # Example
//!
//! ```rust
//! use plinth_bind::{BindContext, ErrorDetail, Resolve, ResolveScope};
//! use plinth_macros::{Input, Walk};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Walk)]
//! #[walk(resolve)]
//! struct Dep {
//!     #[serde(default)]
//!     one: String,
//!     #[serde(default)]
//!     two: String,
//! }
//!
//! impl Resolve for Dep {
//!     fn resolve(&self, _ctx: &BindContext, errors: &mut ResolveScope<'_>) {
//!         if !self.one.is_empty() && !self.two.is_empty() {
//!             errors.add_error(ErrorDetail::new("Only one of ['one', 'two'] is allowed.", "one", self.one.clone()));
//!         }
//!     }
//! }
//!
//! #[derive(Input)]
//! struct Create {
//!     #[input(query = "dry_run")]
//!     dry_run: bool,
//!     #[input(body)]
//!     body: Dep,
//! }
//! ```

mod input;
mod parse;
mod walk;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `Input` and `Walk` for a request shape.
///
/// Every field needs exactly one source:
///
/// - `#[input(query = "key")]`, `#[input(header = "key")]`,
///   `#[input(path = "key")]`: a textual parameter; the field type must
///   implement `FromParam`
/// - `#[input(body)]`: the decoded JSON body; the field type must implement
///   `Deserialize` and `Walk`
/// - `#[input(raw_body)]`: the untouched body; the field type must implement
///   `From<Bytes>` (`Bytes`, `Vec<u8>`)
/// - `#[input(skip)]`: left at `Default::default()`
///
/// Optional field settings: `schema = "path::to_fn"` names a
/// `fn() -> serde_json::Value` returning the constraint set, and
/// `time_format = "<strftime>"` overrides RFC 3339 for timestamps.
///
/// Struct settings: `#[input(resolve)]` when the type implements `Resolve`,
/// and `#[input(crate = "path")]` when the runtime crate is not reachable as
/// `::plinth_bind`.
///
/// Declaring two body or two raw-body fields is a compile error.
#[proc_macro_derive(Input, attributes(input))]
pub fn derive_input(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    input::expand_input(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `Walk` for a nested value.
///
/// Fields are visited in declaration order under their wire name:
/// `#[walk(rename = "..")]`, else `#[serde(rename = "..")]`, else the field
/// name with any `#[serde(rename_all = "..")]` rule applied. `#[walk(skip)]`
/// leaves a field out. `#[walk(resolve)]` on the struct marks it as
/// implementing `Resolve`.
#[proc_macro_derive(Walk, attributes(walk))]
pub fn derive_walk(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    walk::expand_walk(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
