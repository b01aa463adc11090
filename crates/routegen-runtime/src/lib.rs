//! # Routegen Runtime
//!
//! The contract between routegen's generated code and the host application.
//!
//! Generated units refer to this crate by path (`::routegen_runtime` unless
//! configured otherwise). They use:
//!
//! - [`RequestContext`] - everything a parameter can be bound from
//! - [`bind`] - lookups, arity helpers and body decoding
//! - [`BindFromContext`] / [`BindWithParameter`] - custom async binders
//! - [`TryParse`] / [`TryParseWithFormat`] - single-value parsers
//! - [`DispatchResult`] / [`IntoDispatchResult`] - handler output
//! - [`EndpointRegistry`] / [`RouteEndpoint`] - where endpoints are mapped
//!
//! # Example
//!
//! A thunk as routegen would generate it for `fn get_todo(id: i32) -> String`:
//!
//! ```rust
//! use routegen_runtime::{
//!     bind, DispatchFuture, DispatchResult, EndpointRegistry, ExtractionSource, HttpVerb,
//!     RequestContext, RequestDelegate,
//! };
//! use std::sync::Arc;
//!
//! fn thunk<F>(handler: F) -> RequestDelegate
//! where
//!     F: Fn(i32) -> String + Send + Sync + 'static,
//! {
//!     let handler = Arc::new(handler);
//!     Arc::new(move |ctx: RequestContext| -> DispatchFuture {
//!         let handler = Arc::clone(&handler);
//!         Box::pin(async move {
//!             let source = ExtractionSource::RouteOrQuery;
//!             let id = match bind::single(source, "id", bind::values(&ctx, source, "id"), |raw| {
//!                 raw.parse::<i32>().ok()
//!             }) {
//!                 Ok(value) => value,
//!                 Err(error) => return DispatchResult::from_extraction_error(&error),
//!             };
//!             DispatchResult::text((*handler)(id))
//!         })
//!     })
//! }
//!
//! let mut endpoints = EndpointRegistry::new();
//! endpoints.map(HttpVerb::Get, "/todos/{id}", thunk(|id| format!("todo {id}")));
//! assert_eq!(endpoints.len(), 1);
//! ```

#![doc(html_root_url = "https://docs.rs/routegen-runtime/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bind;
mod binder;
mod context;
mod error;
mod registry;
mod result;
mod services;

pub use binder::{
    BindFromContext, BindWithParameter, FormatProvider, ParameterInfo, TryParse,
    TryParseWithFormat,
};
pub use context::{Principal, RequestContext, RequestContextBuilder};
pub use error::{ExtractionError, ExtractionSource};
pub use registry::{
    failing_delegate, DispatchFuture, EndpointMetadata, EndpointMetadataProvider,
    EndpointRegistry, HttpVerb, RequestDelegate, RouteEndpoint, RouteMatch,
};
pub use result::{DispatchResult, IntoDispatchResult};
pub use services::Services;

pub use bytes::Bytes;
pub use futures_core::Stream;
pub use http::{HeaderMap, StatusCode};
pub use tokio_util::sync::CancellationToken;
