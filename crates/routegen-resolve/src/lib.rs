//! # Routegen Resolve
//!
//! Binding resolution for routegen.
//!
//! - [`CapabilityCache`] - memoised capability discovery over a catalog
//! - [`extract`] - raw registration to signature model
//! - [`resolve`] - parameter to binding source
//! - [`collect`] - diagnostics of one endpoint
//! - [`EndpointBuilder`] - assembles the immutable endpoint
//!
//! # Example
//!
//! ```rust
//! use routegen_core::{RawParameter, RawRegistration, RawSignature, SourceLocation, TypeCatalog};
//! use routegen_resolve::{CapabilityCache, EndpointBuilder};
//!
//! let catalog = TypeCatalog::new();
//! let cache = CapabilityCache::new(&catalog);
//! let builder = EndpointBuilder::new(&cache, &[]);
//!
//! let registration = RawRegistration {
//!     route: "/todos/{id}".to_string(),
//!     verb: "get".to_string(),
//!     handler: "get_todo".to_string(),
//!     signature: RawSignature {
//!         parameters: vec![RawParameter {
//!             name: "id".to_string(),
//!             ty: "i32".to_string(),
//!             attributes: vec![],
//!             location: SourceLocation::default(),
//!         }],
//!         return_type: Some("Todo".to_string()),
//!         is_async: true,
//!     },
//!     location: SourceLocation::new("handlers.rs", 1, 1),
//! };
//!
//! let endpoint = builder.build(&registration).unwrap();
//! assert!(endpoint.diagnostics.is_empty());
//! ```

#![doc(html_root_url = "https://docs.rs/routegen-resolve/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod capabilities;
mod collector;
mod resolver;
mod signature;

pub use builder::EndpointBuilder;
pub use capabilities::CapabilityCache;
pub use collector::{collect, Outcome};
pub use resolver::{resolve, ResolutionFailure};
pub use signature::extract;
