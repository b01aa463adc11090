//! # Routegen Codegen
//!
//! Turns resolved endpoints into Rust source.
//!
//! Endpoints are first partitioned by dispatch shape ([`partition`]); each
//! shape gets one generic thunk, rendered independently by
//! [`Emitter::render_thunk`] so thunks can be rendered in parallel. The unit
//! is then assembled by [`Emitter::render_unit`] in stable source order, so
//! identical input always yields byte-identical output.
//!
//! ## Generated code
//!
//! For `#[route(get, "/todos/{id}")] async fn get_todo(id: i32) -> Todo` the
//! unit contains, roughly:
//!
//! ```text
//! pub fn thunk_3f1c0e9a8b7d6c54<F, Fut>(handler: F) -> RequestDelegate
//! where
//!     F: Fn(i32) -> Fut + Send + Sync + 'static,
//!     Fut: Future<Output = Todo> + Send + 'static,
//! { ... }
//!
//! pub fn map_get_get_todo<F, Fut>(endpoints: &mut EndpointRegistry, handler: F)
//!     -> &mut RouteEndpoint
//! { endpoints.map(HttpVerb::Get, "/todos/{id}", thunk_3f1c0e9a8b7d6c54(handler)) }
//! ```

#![doc(html_root_url = "https://docs.rs/routegen-codegen/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dedup;
mod emit;
mod extraction;

pub use dedup::{partition, stable_order, GroupKey, ThunkGroup};
pub use emit::{EmitOptions, Emitter, SourceUnit};
