//! Signature extraction.
//!
//! Turns a [`RawRegistration`] into a [`HandlerSignature`]: one typed
//! descriptor per parameter in source order plus the return shape. The only
//! failure mode is a single `MalformedSignature` diagnostic, after which the
//! registration is dropped.

use crate::capabilities::CapabilityCache;
use routegen_core::{
    generic_args, AwaitedOutput, BindingAttribute, Diagnostic, FieldDecl,
    FieldExpansion, HandlerSignature, HttpVerb, ParameterDescriptor, RawParameter,
    RawRegistration, RawSignature, ReturnShape, SourceLocation, TypeCapabilities, TypeRef,
    ValueShape,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Builds the signature model of one registration.
pub fn extract(
    registration: &RawRegistration,
    capabilities: &CapabilityCache<'_>,
) -> Result<HandlerSignature, Diagnostic> {
    let location = &registration.location;
    if registration.route.trim().is_empty() {
        return Err(Diagnostic::malformed(location.clone(), "route pattern is empty"));
    }
    let verb = HttpVerb::parse(&registration.verb).ok_or_else(|| {
        Diagnostic::malformed(
            location.clone(),
            format!("unknown HTTP verb `{}`", registration.verb),
        )
    })?;
    if registration.handler.trim().is_empty() {
        return Err(Diagnostic::malformed(location.clone(), "handler path is empty"));
    }

    let mut names = HashSet::new();
    let mut parameters = Vec::with_capacity(registration.signature.parameters.len());
    for (index, raw) in registration.signature.parameters.iter().enumerate() {
        let param_location = located(&raw.location, location);
        if raw.name.trim().is_empty() {
            return Err(Diagnostic::malformed(
                param_location,
                format!("parameter {} has no name", index + 1),
            ));
        }
        if !names.insert(raw.name.as_str()) {
            return Err(Diagnostic::malformed(
                param_location,
                format!("duplicate parameter name `{}`", raw.name),
            ));
        }
        parameters.push(describe(raw, param_location, capabilities)?);
    }

    let (return_shape, return_capabilities) =
        classify_return(&registration.signature, capabilities)
            .map_err(|reason| Diagnostic::malformed(location.clone(), reason))?;

    Ok(HandlerSignature {
        route: registration.route.clone(),
        verb,
        handler: registration.handler.clone(),
        location: location.clone(),
        parameters,
        return_shape,
        return_capabilities,
    })
}

fn located(own: &SourceLocation, fallback: &SourceLocation) -> SourceLocation {
    if own == &SourceLocation::default() {
        fallback.clone()
    } else {
        own.clone()
    }
}

fn describe(
    raw: &RawParameter,
    location: SourceLocation,
    capabilities: &CapabilityCache<'_>,
) -> Result<ParameterDescriptor, Diagnostic> {
    let parsed: syn::Type = syn::parse_str(&raw.ty).map_err(|e| {
        Diagnostic::malformed(
            location.clone(),
            format!("parameter `{}` has invalid type `{}`: {e}", raw.name, raw.ty),
        )
    })?;
    let shape = ValueShape::of(&parsed);
    let caps = capabilities.get(&shape.inner);
    let fields = if raw.attributes.contains(&BindingAttribute::AsParameters) {
        expand_fields(&shape, &location, capabilities)
    } else {
        FieldExpansion::None
    };

    Ok(ParameterDescriptor {
        name: raw.name.clone(),
        ty: TypeRef::from_syn(&parsed),
        shape,
        location,
        attributes: raw.attributes.clone(),
        capabilities: caps,
        fields,
    })
}

fn expand_fields(
    shape: &ValueShape,
    location: &SourceLocation,
    capabilities: &CapabilityCache<'_>,
) -> FieldExpansion {
    if shape.optional || shape.sequence {
        return FieldExpansion::Invalid(format!(
            "`{}` must be used directly, not wrapped in `Option` or `Vec`",
            shape.inner
        ));
    }
    let Some(decl) = capabilities.catalog().get(&shape.inner) else {
        return FieldExpansion::Invalid(format!("`{}` is not a known type", shape.inner));
    };
    if decl.fields.is_empty() {
        return FieldExpansion::Invalid(format!("`{}` has no bindable fields", shape.inner));
    }

    let mut expanded = Vec::with_capacity(decl.fields.len());
    for field in &decl.fields {
        match describe_field(field, location, capabilities) {
            Ok(descriptor) => expanded.push(descriptor),
            Err(reason) => return FieldExpansion::Invalid(reason),
        }
    }
    FieldExpansion::Expanded(expanded)
}

fn describe_field(
    field: &FieldDecl,
    fallback: &SourceLocation,
    capabilities: &CapabilityCache<'_>,
) -> Result<ParameterDescriptor, String> {
    if syn::parse_str::<syn::Ident>(&field.name).is_err() {
        return Err(format!("field name `{}` is not an identifier", field.name));
    }
    let parsed: syn::Type = syn::parse_str(&field.ty)
        .map_err(|e| format!("field `{}` has invalid type `{}`: {e}", field.name, field.ty))?;
    let shape = ValueShape::of(&parsed);
    let caps = capabilities.get(&shape.inner);
    Ok(ParameterDescriptor {
        name: field.name.clone(),
        ty: TypeRef::from_syn(&parsed),
        shape,
        location: field.location.clone().unwrap_or_else(|| fallback.clone()),
        attributes: field.attributes.clone(),
        capabilities: caps,
        fields: FieldExpansion::None,
    })
}

fn classify_return(
    signature: &RawSignature,
    capabilities: &CapabilityCache<'_>,
) -> Result<(ReturnShape, Option<Arc<TypeCapabilities>>), String> {
    let parsed = match signature.return_type.as_deref().map(str::trim) {
        None | Some("" | "()") => None,
        Some(text) => Some(
            syn::parse_str::<syn::Type>(text)
                .map_err(|e| format!("invalid return type `{text}`: {e}"))?,
        ),
    };
    let parsed = parsed.filter(|ty| !is_unit(ty));

    if signature.is_async {
        let output = classify_awaited(parsed.as_ref(), capabilities);
        return Ok(with_capabilities(ReturnShape::Awaitable(output), capabilities));
    }

    let Some(ty) = parsed else {
        return Ok((ReturnShape::Void, None));
    };
    if let Some(output) = impl_trait_assoc(&ty, "Future", "Output") {
        let output = Some(output).filter(|ty| !is_unit(ty));
        let awaited = classify_awaited(output.as_ref(), capabilities);
        return Ok(with_capabilities(ReturnShape::Awaitable(awaited), capabilities));
    }
    if let Some(item) = impl_trait_assoc(&ty, "Stream", "Item") {
        return Ok(with_capabilities(
            ReturnShape::Stream(TypeRef::from_syn(&item)),
            capabilities,
        ));
    }
    let shape = if is_result_capable(&ty, capabilities) {
        ReturnShape::ResultCapability(TypeRef::from_syn(&ty))
    } else {
        ReturnShape::Value(TypeRef::from_syn(&ty))
    };
    Ok(with_capabilities(shape, capabilities))
}

fn with_capabilities(
    shape: ReturnShape,
    capabilities: &CapabilityCache<'_>,
) -> (ReturnShape, Option<Arc<TypeCapabilities>>) {
    let caps = shape.value_type().map(|ty| capabilities.get(ty));
    (shape, caps)
}

fn classify_awaited(ty: Option<&syn::Type>, capabilities: &CapabilityCache<'_>) -> AwaitedOutput {
    match ty {
        None => AwaitedOutput::Unit,
        Some(ty) if is_result_capable(ty, capabilities) => {
            AwaitedOutput::ResultCapability(TypeRef::from_syn(ty))
        }
        Some(ty) => AwaitedOutput::Value(TypeRef::from_syn(ty)),
    }
}

fn is_result_capable(ty: &syn::Type, capabilities: &CapabilityCache<'_>) -> bool {
    generic_args(ty, "Result").is_some_and(|args| args.len() == 2)
        || capabilities.get(&TypeRef::from_syn(ty)).result_capability
}

fn is_unit(ty: &syn::Type) -> bool {
    matches!(ty, syn::Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// For `impl Trait<Assoc = T>` returns `T`.
fn impl_trait_assoc(ty: &syn::Type, trait_name: &str, assoc: &str) -> Option<syn::Type> {
    let syn::Type::ImplTrait(impl_trait) = ty else {
        return None;
    };
    impl_trait.bounds.iter().find_map(|bound| {
        let syn::TypeParamBound::Trait(bound) = bound else {
            return None;
        };
        let segment = bound.path.segments.last()?;
        if segment.ident != trait_name {
            return None;
        }
        let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
            return None;
        };
        args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::AssocType(binding) if binding.ident == assoc => {
                Some(binding.ty.clone())
            }
            _ => None,
        })
    })
}
