//! # Routegen Core
//!
//! Data model for the routegen endpoint binding resolver.
//!
//! This crate provides the types shared by every stage of the pipeline:
//!
//! - [`TypeRef`] / [`ValueShape`] - canonical type identities
//! - [`TypeCatalog`] - declared types, their bases, interfaces and members
//! - [`RawRegistration`] - what a signature provider hands over
//! - [`ParameterDescriptor`] / [`HandlerSignature`] - the signature model
//! - [`BindingSource`] - where a parameter's value comes from
//! - [`Diagnostic`] - problems with individual registrations
//! - [`Endpoint`] - the immutable endpoint aggregate
//! - [`MetadataProvider`] / [`SignatureProvider`] - extension points
//! - [`RoutegenError`] - API-level errors

#![doc(html_root_url = "https://docs.rs/routegen-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;
mod capability;
pub mod catalog;
mod diagnostic;
mod endpoint;
mod error;
mod location;
mod metadata;
mod provider;
mod signature;
mod types;

pub use binding::{BindingSource, FieldBinding, FrameworkType, ValueParser};
pub use capability::{CapabilityFlags, MemberCandidate, TypeCapabilities};
pub use catalog::{
    well_known, BindTarget, FieldDecl, GenericRef, MemberDecl, MemberKind, TypeCatalog, TypeDecl,
    TypeKind,
};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use endpoint::{Endpoint, ResolvedParameter};
pub use error::{RoutegenError, RoutegenResult};
pub use location::SourceLocation;
pub use metadata::{MetadataEntry, MetadataProvider, MetadataSink};
pub use provider::SignatureProvider;
pub use signature::{
    AttributeCategory, AwaitedOutput, BindingAttribute, FieldExpansion, HandlerSignature,
    HttpVerb, ParameterDescriptor, RawParameter, RawRegistration, RawSignature, ReturnShape,
};
pub use types::{generic_args, single_generic_arg, TypeRef, ValueShape};
