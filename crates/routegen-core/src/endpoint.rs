//! The endpoint aggregate.

use crate::binding::BindingSource;
use crate::diagnostic::Diagnostic;
use crate::location::SourceLocation;
use crate::metadata::MetadataEntry;
use crate::signature::{HttpVerb, ParameterDescriptor, ReturnShape};
use crate::types::TypeRef;

/// A parameter with its binding decision.
///
/// `binding` is `None` when resolution failed; the endpoint then carries an
/// error diagnostic explaining why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParameter {
    /// The parameter.
    pub descriptor: ParameterDescriptor,
    /// Where its value comes from.
    pub binding: Option<BindingSource>,
}

/// One fully described endpoint.
///
/// Built once by the endpoint builder and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Route pattern.
    pub route: String,
    /// HTTP verb.
    pub verb: HttpVerb,
    /// Handler path.
    pub handler: String,
    /// Parameters in source order.
    pub parameters: Vec<ResolvedParameter>,
    /// Return shape.
    pub return_shape: ReturnShape,
    /// Diagnostics raised for this endpoint, sorted.
    pub diagnostics: Vec<Diagnostic>,
    /// Registration site.
    pub location: SourceLocation,
    /// Types whose `populate_metadata` runs at registration.
    pub metadata_types: Vec<TypeRef>,
    /// Entries appended by metadata providers.
    pub metadata: Vec<MetadataEntry>,
}

impl Endpoint {
    /// Returns `true` if any diagnostic has error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Bindings in parameter order, `None` where resolution failed.
    pub fn bindings(&self) -> impl Iterator<Item = Option<&BindingSource>> {
        self.parameters.iter().map(|p| p.binding.as_ref())
    }
}
