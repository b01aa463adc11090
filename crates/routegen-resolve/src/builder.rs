//! Endpoint assembly.

use crate::capabilities::CapabilityCache;
use crate::collector::{collect, Outcome};
use crate::resolver::resolve;
use crate::signature::extract;
use routegen_core::{
    Diagnostic, Endpoint, MemberKind, MetadataProvider, MetadataSink, RawRegistration,
    ResolvedParameter, TypeRef,
};
use std::sync::Arc;

/// Builds immutable [`Endpoint`]s from raw registrations.
///
/// A builder borrows the capability cache of the current snapshot and the
/// registered metadata providers; it holds no state of its own, so one
/// builder can be shared by all worker threads.
pub struct EndpointBuilder<'a> {
    capabilities: &'a CapabilityCache<'a>,
    providers: &'a [Arc<dyn MetadataProvider>],
}

impl<'a> EndpointBuilder<'a> {
    /// Creates a builder.
    #[must_use]
    pub fn new(
        capabilities: &'a CapabilityCache<'a>,
        providers: &'a [Arc<dyn MetadataProvider>],
    ) -> Self {
        Self {
            capabilities,
            providers,
        }
    }

    /// Builds one endpoint.
    ///
    /// Returns the `MalformedSignature` diagnostic when the registration
    /// cannot be described at all; every other problem is recorded on the
    /// endpoint.
    pub fn build(&self, registration: &RawRegistration) -> Result<Endpoint, Diagnostic> {
        let signature = extract(registration, self.capabilities)?;

        let outcomes: Vec<Outcome> = signature
            .parameters
            .into_iter()
            .map(|descriptor| {
                let result = resolve(&descriptor);
                (descriptor, result)
            })
            .collect();
        let diagnostics = collect(&outcomes);

        let mut metadata_types: Vec<TypeRef> = Vec::new();
        let provided = outcomes
            .iter()
            .map(|(descriptor, _)| &descriptor.capabilities)
            .chain(signature.return_capabilities.as_ref());
        for caps in provided {
            if caps.has(MemberKind::PopulateMetadata) && !metadata_types.contains(&caps.ty) {
                metadata_types.push(caps.ty.clone());
            }
        }

        let parameters = outcomes
            .into_iter()
            .map(|(descriptor, result)| ResolvedParameter {
                descriptor,
                binding: result.ok(),
            })
            .collect();

        let mut endpoint = Endpoint {
            route: signature.route,
            verb: signature.verb,
            handler: signature.handler,
            parameters,
            return_shape: signature.return_shape,
            diagnostics,
            location: signature.location,
            metadata_types,
            metadata: Vec::new(),
        };

        let mut sink = MetadataSink::new();
        for provider in self.providers {
            provider.populate(&endpoint, &mut sink);
        }
        endpoint.metadata = sink.into_entries();

        tracing::trace!(
            verb = %endpoint.verb,
            route = %endpoint.route,
            handler = %endpoint.handler,
            diagnostics = endpoint.diagnostics.len(),
            "endpoint built"
        );
        Ok(endpoint)
    }
}
