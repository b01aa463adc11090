//! Walks a parsed file and collects registrations and type declarations.
//!
//! Types are keyed by their last path segment, so handlers should refer to
//! them by the name they are declared with. An `impl Deref` on a type makes
//! its `Target` the type's base.

use crate::attrs::{self, RouteAttr};
use crate::error::SyntaxError;
use quote::ToTokens;
use routegen_core::{
    generic_args, single_generic_arg, BindTarget, BindingAttribute, FieldDecl,
    GenericRef, MemberDecl, MemberKind, RawParameter, RawRegistration, RawSignature, TypeDecl,
    TypeRef,
};
use syn::spanned::Spanned;
use syn::{
    Attribute, FnArg, Ident, ImplItem, Item, ItemImpl, ItemStruct, ItemTrait, Pat, PathArguments,
    ReturnType, Signature, TraitItem, Type, TypeParamBound,
};

pub(crate) struct Collector<'f> {
    file: &'f str,
    pub(crate) registrations: Vec<RawRegistration>,
    pub(crate) types: Vec<TypeDecl>,
}

impl<'f> Collector<'f> {
    pub(crate) fn new(file: &'f str) -> Self {
        Self {
            file,
            registrations: Vec::new(),
            types: Vec::new(),
        }
    }

    pub(crate) fn items(&mut self, items: &[Item], module: &[String]) -> Result<(), SyntaxError> {
        for item in items {
            match item {
                Item::Fn(f) => self.handler(&f.attrs, &f.sig, module, None)?,
                Item::Struct(s) => self.record_struct(s)?,
                Item::Enum(e) => {
                    let mut decl = TypeDecl::record(ident_ref(&e.ident));
                    decl.location = Some(crate::location(self.file, e.ident.span()));
                    self.types.push(decl);
                }
                Item::Trait(t) => self.record_trait(t),
                Item::Impl(i) => self.record_impl(i, module)?,
                Item::Mod(m) => {
                    if let Some((_, content)) = &m.content {
                        let mut nested = module.to_vec();
                        nested.push(m.ident.to_string());
                        self.items(content, &nested)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handler(
        &mut self,
        attrs: &[Attribute],
        sig: &Signature,
        module: &[String],
        owner: Option<&str>,
    ) -> Result<(), SyntaxError> {
        let routes = attrs
            .iter()
            .filter(|a| attrs::is_route(a))
            .map(|a| {
                a.parse_args::<RouteAttr>()
                    .map(|route| (route, a.span()))
                    .map_err(|e| SyntaxError::attribute(attrs::ROUTE, self.file, &e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if routes.is_empty() {
            return Ok(());
        }

        let signature = self.signature(sig)?;
        let mut path: Vec<String> = module.to_vec();
        path.extend(owner.map(str::to_string));
        path.push(sig.ident.to_string());
        let handler = path.join("::");

        for (route, span) in routes {
            self.registrations.push(RawRegistration {
                route: route.pattern.value(),
                verb: route.verb.to_string(),
                handler: handler.clone(),
                signature: signature.clone(),
                location: crate::location(self.file, span),
            });
        }
        Ok(())
    }

    fn signature(&self, sig: &Signature) -> Result<RawSignature, SyntaxError> {
        let mut parameters = Vec::with_capacity(sig.inputs.len());
        for (index, input) in sig.inputs.iter().enumerate() {
            let FnArg::Typed(typed) = input else {
                let error = syn::Error::new(input.span(), "route handlers cannot take `self`");
                return Err(SyntaxError::attribute(attrs::ROUTE, self.file, &error));
            };
            let name = match &*typed.pat {
                Pat::Ident(pat) => pat.ident.to_string(),
                _ => format!("arg{index}"),
            };
            parameters.push(RawParameter {
                name,
                ty: typed.ty.to_token_stream().to_string(),
                attributes: self.binding_attributes(&typed.attrs)?,
                location: crate::location(self.file, typed.pat.span()),
            });
        }

        Ok(RawSignature {
            parameters,
            return_type: match &sig.output {
                ReturnType::Default => None,
                ReturnType::Type(_, ty) => Some(ty.to_token_stream().to_string()),
            },
            is_async: sig.asyncness.is_some(),
        })
    }

    fn binding_attributes(&self, attrs: &[Attribute]) -> Result<Vec<BindingAttribute>, SyntaxError> {
        let mut found = Vec::new();
        for attr in attrs {
            let parsed = attrs::binding_attribute(attr).map_err(|e| {
                let name = attrs::attribute_name(attr).unwrap_or_default();
                SyntaxError::attribute(&name, self.file, &e)
            })?;
            found.extend(parsed);
        }
        Ok(found)
    }

    fn record_struct(&mut self, item: &ItemStruct) -> Result<(), SyntaxError> {
        let mut decl = TypeDecl::record(ident_ref(&item.ident));
        decl.location = Some(crate::location(self.file, item.ident.span()));
        for field in &item.fields {
            let Some(ident) = &field.ident else {
                continue;
            };
            decl.fields.push(FieldDecl {
                name: ident.to_string(),
                ty: field.ty.to_token_stream().to_string(),
                attributes: self.binding_attributes(&field.attrs)?,
                location: Some(crate::location(self.file, ident.span())),
            });
        }
        self.types.push(decl);
        Ok(())
    }

    fn record_trait(&mut self, item: &ItemTrait) {
        let own = ident_ref(&item.ident);
        let params: Vec<String> = item
            .generics
            .type_params()
            .map(|p| p.ident.to_string())
            .collect();

        let mut decl = TypeDecl::interface(own.clone());
        decl.location = Some(crate::location(self.file, item.ident.span()));
        for bound in &item.supertraits {
            if let TypeParamBound::Trait(bound) = bound {
                if let Some(reference) = generic_ref(&bound.path) {
                    decl.interfaces.push(reference);
                }
            }
        }
        for member in &item.items {
            if let TraitItem::Fn(f) = member {
                if let Some(kind) = member_kind(&f.sig.ident) {
                    let binds = bind_target(&f.sig.output, &own, &params);
                    decl.members.push(MemberDecl::new(kind).binding(binds));
                }
            }
        }
        self.types.push(decl);
    }

    fn record_impl(&mut self, item: &ItemImpl, module: &[String]) -> Result<(), SyntaxError> {
        let Some(owner) = type_ident(&item.self_ty) else {
            return Ok(());
        };
        let own = ident_ref(owner);
        let mut decl = TypeDecl::record(own.clone());

        match &item.trait_ {
            Some((_, path, _)) => {
                let Some(reference) = generic_ref(path) else {
                    return Ok(());
                };
                if reference.name.as_str() == "Deref" {
                    decl.base = item.items.iter().find_map(|i| match i {
                        ImplItem::Type(t) if t.ident == "Target" => type_generic_ref(&t.ty),
                        _ => None,
                    });
                } else {
                    decl.interfaces.push(reference);
                }
            }
            None => {
                let owner_name = owner.to_string();
                for member in &item.items {
                    let ImplItem::Fn(f) = member else {
                        continue;
                    };
                    self.handler(&f.attrs, &f.sig, module, Some(&owner_name))?;
                    if let Some(kind) = member_kind(&f.sig.ident) {
                        let binds = bind_target(&f.sig.output, &own, &[]);
                        decl.members.push(MemberDecl::new(kind).binding(binds));
                    }
                }
            }
        }

        if decl.base.is_some() || !decl.interfaces.is_empty() || !decl.members.is_empty() {
            self.types.push(decl);
        }
        Ok(())
    }
}

fn member_kind(ident: &Ident) -> Option<MemberKind> {
    [
        MemberKind::BindWithParameter,
        MemberKind::Bind,
        MemberKind::TryParseWithFormat,
        MemberKind::TryParse,
        MemberKind::FromStr,
        MemberKind::PopulateMetadata,
    ]
    .into_iter()
    .find(|kind| ident == kind.method_name())
}

fn ident_ref(ident: &Ident) -> TypeRef {
    TypeRef::from_syn(&Type::Path(syn::TypePath {
        qself: None,
        path: ident.clone().into(),
    }))
}

fn type_ident(ty: &Type) -> Option<&Ident> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last().map(|s| &s.ident),
        _ => None,
    }
}

fn generic_ref(path: &syn::Path) -> Option<GenericRef> {
    let segment = path.segments.last()?;
    let args = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(TypeRef::from_syn(ty)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Some(GenericRef::with_args(ident_ref(&segment.ident), args))
}

fn type_generic_ref(ty: &Type) -> Option<GenericRef> {
    match ty {
        Type::Path(path) if path.qself.is_none() => generic_ref(&path.path),
        _ => None,
    }
}

/// The type a parse or bind member produces: `Option`, `Result`, `Pin`,
/// `Box` and `Future<Output = _>` wrappers are looked through.
fn produced_type(ty: &Type) -> &Type {
    if let Some(inner) = single_generic_arg(ty, "Option")
        .or_else(|| single_generic_arg(ty, "Pin"))
        .or_else(|| single_generic_arg(ty, "Box"))
        .or_else(|| generic_args(ty, "Result").and_then(|args| args.first().copied()))
    {
        return produced_type(inner);
    }
    let bounds = match ty {
        Type::ImplTrait(t) => &t.bounds,
        Type::TraitObject(t) => &t.bounds,
        _ => return ty,
    };
    bounds
        .iter()
        .find_map(|bound| {
            let TypeParamBound::Trait(bound) = bound else {
                return None;
            };
            let segment = bound.path.segments.last()?;
            if segment.ident != "Future" {
                return None;
            }
            let PathArguments::AngleBracketed(args) = &segment.arguments else {
                return None;
            };
            args.args.iter().find_map(|arg| match arg {
                syn::GenericArgument::AssocType(assoc) if assoc.ident == "Output" => {
                    Some(produced_type(&assoc.ty))
                }
                _ => None,
            })
        })
        .unwrap_or(ty)
}

fn bind_target(output: &ReturnType, own: &TypeRef, params: &[String]) -> BindTarget {
    let ReturnType::Type(_, ty) = output else {
        return BindTarget::SelfType;
    };
    let produced = produced_type(ty);
    if let Type::Path(path) = produced {
        if path.qself.is_none() {
            if let Some(segment) = path.path.segments.last() {
                if path.path.is_ident("Self") || segment.ident == own.base_name() {
                    return BindTarget::SelfType;
                }
                if let Some(index) = params.iter().position(|p| path.path.is_ident(p)) {
                    return BindTarget::TypeArg(index);
                }
            }
        }
    }
    if matches!(produced, Type::Tuple(t) if t.elems.is_empty()) {
        return BindTarget::SelfType;
    }
    BindTarget::Concrete(TypeRef::from_syn(produced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn own() -> TypeRef {
        TypeRef::parse("Celsius").unwrap()
    }

    #[test]
    fn test_bind_target_self() {
        let output: ReturnType = parse_quote!(-> Option<Self>);
        assert_eq!(bind_target(&output, &own(), &[]), BindTarget::SelfType);

        let output: ReturnType = parse_quote!(-> Result<Celsius, ParseError>);
        assert_eq!(bind_target(&output, &own(), &[]), BindTarget::SelfType);

        let output: ReturnType = parse_quote!(-> Pin<Box<dyn Future<Output = Option<Self>> + Send + 'a>>);
        assert_eq!(bind_target(&output, &own(), &[]), BindTarget::SelfType);
    }

    #[test]
    fn test_bind_target_other_types() {
        let output: ReturnType = parse_quote!(-> Option<Kelvin>);
        assert_eq!(
            bind_target(&output, &own(), &[]),
            BindTarget::Concrete(TypeRef::parse("Kelvin").unwrap())
        );

        let output: ReturnType = parse_quote!(-> impl Future<Output = Option<T>>);
        assert_eq!(
            bind_target(&output, &own(), &["K".to_string(), "T".to_string()]),
            BindTarget::TypeArg(1)
        );
    }

    #[test]
    fn test_member_kind_by_name() {
        let ident: Ident = parse_quote!(try_parse_with_format);
        assert_eq!(member_kind(&ident), Some(MemberKind::TryParseWithFormat));
        let ident: Ident = parse_quote!(parse);
        assert_eq!(member_kind(&ident), None);
    }
}
