//! # Routegen Syntax
//!
//! Reads handler registrations and the type catalog directly from Rust
//! source with `syn`.
//!
//! ```rust,ignore
//! #[route(get, "/todos/{id}")]
//! async fn get_todo(#[from_route] id: i32, #[from_services] store: Arc<Store>) -> Todo { .. }
//! ```
//!
//! Parameter attributes: `#[from_route]`, `#[from_query]`, `#[from_header]`,
//! `#[from_form]` (all accept `name = "..."`), `#[from_body]` (accepts
//! `allow_empty`), `#[from_services]` and `#[as_parameters]`.
//!
//! The catalog is built from `struct`, `enum` and `trait` items, inherent
//! `impl` blocks (members named `bind_with_parameter`, `bind`,
//! `try_parse_with_format`, `try_parse`, `from_str`, `populate_metadata`)
//! and trait `impl`s, which list the trait as an interface of the type.

#![doc(html_root_url = "https://docs.rs/routegen-syntax/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod attrs;
mod collect;
mod error;
mod provider;

pub use error::SyntaxError;
pub use provider::SourceProvider;

use routegen_core::SourceLocation;

/// One-based line and column of a span's start.
pub(crate) fn location(file: &str, span: proc_macro2::Span) -> SourceLocation {
    let start = span.start();
    SourceLocation::new(
        file,
        u32::try_from(start.line).unwrap_or(u32::MAX),
        u32::try_from(start.column + 1).unwrap_or(u32::MAX),
    )
}
