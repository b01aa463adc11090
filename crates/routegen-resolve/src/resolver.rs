//! Binding strategy resolution.
//!
//! Decides, per parameter, where its runtime value comes from. The
//! precedence is total; the first rule that applies wins:
//!
//! 1. an explicit binding attribute,
//! 2. a framework type, matched by exact identity,
//! 3. `bind_with_parameter(ctx, parameter)`,
//! 4. `bind(ctx)`,
//! 5. `try_parse_with_format(value, format)`,
//! 6. `try_parse(value)`,
//! 7. a primitive or string-convertible type, read from route or query,
//! 8. otherwise the JSON body.
//!
//! Within one rule the member declared on the most derived type wins. Two
//! members at the same depth are ambiguous.

use routegen_core::{
    well_known, AttributeCategory, BindingAttribute, BindingSource, FieldBinding, FieldExpansion,
    FrameworkType, MemberKind, ParameterDescriptor, TypeCapabilities, TypeRef, ValueParser,
};
use thiserror::Error;

/// Why a parameter could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    /// Two members of the same kind at the same depth.
    #[error("`{member}` is provided by both {}", join(.declaring_types))]
    Ambiguous {
        /// Method name of the tied members.
        member: &'static str,
        /// Types declaring them.
        declaring_types: Vec<TypeRef>,
    },

    /// More than one explicit attribute category.
    #[error("conflicting binding attributes {}", join(.categories))]
    ConflictingAttributes {
        /// The categories found.
        categories: Vec<AttributeCategory>,
    },

    /// The aggregate cannot be bound field by field.
    #[error("{reason}")]
    InvalidAsParameters {
        /// What is wrong with it.
        reason: String,
    },
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| format!("`{item}`"))
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Resolves the binding source of one parameter.
pub fn resolve(descriptor: &ParameterDescriptor) -> Result<BindingSource, ResolutionFailure> {
    let categories = descriptor.categories();
    if categories.len() > 1 {
        return Err(ResolutionFailure::ConflictingAttributes { categories });
    }
    if let Some(category) = categories.first() {
        return explicit(descriptor, *category);
    }

    if let Some(framework) = FrameworkType::from_type(&descriptor.ty) {
        return Ok(BindingSource::SpecialFrameworkType { framework });
    }

    let caps = &descriptor.capabilities;
    // A binder produces a single value, never a sequence.
    let single = !descriptor.shape.sequence;
    if single && pick(caps, MemberKind::BindWithParameter)? {
        return Ok(BindingSource::AsyncBinderWithParameterInfo {
            parameter_name: descriptor.name.clone(),
        });
    }
    if single && pick(caps, MemberKind::Bind)? {
        return Ok(BindingSource::AsyncBinderContextOnly);
    }
    if pick(caps, MemberKind::TryParseWithFormat)? {
        return Ok(BindingSource::ParseWithFormatProvider {
            key: descriptor.name.clone(),
        });
    }
    if pick(caps, MemberKind::TryParse)? {
        return Ok(BindingSource::ParseSimple {
            key: descriptor.name.clone(),
        });
    }
    if descriptor.flags().is_simple {
        return Ok(BindingSource::ImplicitRouteOrQuery {
            key: descriptor.name.clone(),
            parser: simple_parser(caps),
        });
    }
    Ok(BindingSource::ImplicitBody)
}

/// Returns `Ok(true)` if exactly one shallowest member of `kind` exists.
fn pick(caps: &TypeCapabilities, kind: MemberKind) -> Result<bool, ResolutionFailure> {
    let Some(shallowest) = caps.of_kind(kind).next() else {
        return Ok(false);
    };
    let mut tied: Vec<TypeRef> = caps
        .of_kind(kind)
        .filter(|c| c.depth == shallowest.depth)
        .map(|c| c.declaring_type.clone())
        .collect();
    tied.dedup();
    if tied.len() > 1 {
        return Err(ResolutionFailure::Ambiguous {
            member: kind.method_name(),
            declaring_types: tied,
        });
    }
    Ok(true)
}

fn simple_parser(caps: &TypeCapabilities) -> ValueParser {
    if well_known::is_string(&caps.ty) {
        ValueParser::Identity
    } else {
        ValueParser::FromStr
    }
}

/// Best conversion for an explicit key-based attribute.
fn best_parser(caps: &TypeCapabilities) -> Result<ValueParser, ResolutionFailure> {
    if well_known::is_string(&caps.ty) {
        return Ok(ValueParser::Identity);
    }
    if pick(caps, MemberKind::TryParseWithFormat)? {
        return Ok(ValueParser::TryParseWithFormat);
    }
    if pick(caps, MemberKind::TryParse)? {
        return Ok(ValueParser::TryParse);
    }
    if caps.flags().is_simple {
        return Ok(ValueParser::FromStr);
    }
    Ok(ValueParser::Deserialize)
}

fn explicit(
    descriptor: &ParameterDescriptor,
    category: AttributeCategory,
) -> Result<BindingSource, ResolutionFailure> {
    let caps = &descriptor.capabilities;
    let source = match category {
        AttributeCategory::Route => BindingSource::ExplicitRoute {
            key: descriptor.key(),
            parser: best_parser(caps)?,
        },
        AttributeCategory::Query => BindingSource::ExplicitQuery {
            key: descriptor.key(),
            parser: best_parser(caps)?,
        },
        AttributeCategory::Header => BindingSource::ExplicitHeader {
            key: descriptor.key(),
            parser: best_parser(caps)?,
        },
        AttributeCategory::Form => BindingSource::ExplicitForm {
            key: descriptor.key(),
            parser: best_parser(caps)?,
        },
        AttributeCategory::Body => BindingSource::ExplicitBody {
            allow_empty: allow_empty(descriptor),
        },
        AttributeCategory::Services => BindingSource::ExplicitServices,
        AttributeCategory::AsParameters => BindingSource::AsParameters {
            fields: expand(descriptor)?,
        },
    };
    Ok(source)
}

fn allow_empty(descriptor: &ParameterDescriptor) -> bool {
    let mut explicit = descriptor.attributes.iter().filter_map(|attribute| match attribute {
        BindingAttribute::Body { allow_empty } => *allow_empty,
        _ => None,
    });
    let first = explicit.next();
    match first {
        Some(first) => first || explicit.any(|allowed| allowed),
        None => descriptor.shape.optional,
    }
}

fn expand(descriptor: &ParameterDescriptor) -> Result<Vec<FieldBinding>, ResolutionFailure> {
    let fields = match &descriptor.fields {
        FieldExpansion::Expanded(fields) => fields,
        FieldExpansion::Invalid(reason) => {
            return Err(ResolutionFailure::InvalidAsParameters {
                reason: reason.clone(),
            })
        }
        FieldExpansion::None => {
            return Err(ResolutionFailure::InvalidAsParameters {
                reason: format!("`{}` was not expanded", descriptor.ty),
            })
        }
    };

    fields
        .iter()
        .map(|field| {
            if field.attributes.contains(&BindingAttribute::AsParameters) {
                return Err(ResolutionFailure::InvalidAsParameters {
                    reason: format!("field `{}` cannot itself use `as_parameters`", field.name),
                });
            }
            Ok(FieldBinding {
                name: field.name.clone(),
                ty: field.ty.clone(),
                shape: field.shape.clone(),
                source: resolve(field)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilityCache;
    use routegen_core::{
        BindTarget, GenericRef, MemberDecl, SourceLocation, TypeCatalog, TypeDecl, ValueShape,
    };

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    fn descriptor(
        cache: &CapabilityCache<'_>,
        name: &str,
        declared: &str,
        attributes: Vec<BindingAttribute>,
    ) -> ParameterDescriptor {
        let parsed: syn::Type = syn::parse_str(declared).unwrap();
        let shape = ValueShape::of(&parsed);
        ParameterDescriptor {
            name: name.to_string(),
            ty: TypeRef::from_syn(&parsed),
            capabilities: cache.get(&shape.inner),
            shape,
            location: SourceLocation::default(),
            attributes,
            fields: FieldExpansion::None,
        }
    }

    fn catalog(decls: Vec<TypeDecl>) -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        for decl in decls {
            catalog.insert(decl).unwrap();
        }
        catalog
    }

    #[test]
    fn test_implicit_string_and_complex() {
        let catalog = TypeCatalog::new();
        let cache = CapabilityCache::new(&catalog);

        let id = descriptor(&cache, "productId", "String", vec![]);
        let product = descriptor(&cache, "product", "Product", vec![]);

        assert_eq!(
            resolve(&id).unwrap(),
            BindingSource::ImplicitRouteOrQuery {
                key: "productId".to_string(),
                parser: ValueParser::Identity
            }
        );
        assert_eq!(resolve(&product).unwrap(), BindingSource::ImplicitBody);
    }

    #[test]
    fn test_primitive_uses_from_str() {
        let catalog = TypeCatalog::new();
        let cache = CapabilityCache::new(&catalog);

        let page = descriptor(&cache, "page", "Option<u32>", vec![]);
        assert_eq!(
            resolve(&page).unwrap(),
            BindingSource::ImplicitRouteOrQuery {
                key: "page".to_string(),
                parser: ValueParser::FromStr
            }
        );
    }

    #[test]
    fn test_explicit_body() {
        let catalog = TypeCatalog::new();
        let cache = CapabilityCache::new(&catalog);

        let todo = descriptor(
            &cache,
            "todo",
            "Todo",
            vec![BindingAttribute::Body { allow_empty: None }],
        );
        assert_eq!(
            resolve(&todo).unwrap(),
            BindingSource::ExplicitBody { allow_empty: false }
        );

        let optional = descriptor(
            &cache,
            "todo",
            "Option<Todo>",
            vec![BindingAttribute::Body { allow_empty: None }],
        );
        assert_eq!(
            resolve(&optional).unwrap(),
            BindingSource::ExplicitBody { allow_empty: true }
        );

        let forced = descriptor(
            &cache,
            "todo",
            "Option<Todo>",
            vec![BindingAttribute::Body {
                allow_empty: Some(false),
            }],
        );
        assert_eq!(
            resolve(&forced).unwrap(),
            BindingSource::ExplicitBody { allow_empty: false }
        );
    }

    #[test]
    fn test_duplicate_body_attributes_still_resolve() {
        let catalog = TypeCatalog::new();
        let cache = CapabilityCache::new(&catalog);

        let todo = descriptor(
            &cache,
            "todo",
            "Todo",
            vec![
                BindingAttribute::Body {
                    allow_empty: Some(false),
                },
                BindingAttribute::Body {
                    allow_empty: Some(true),
                },
            ],
        );
        assert_eq!(
            resolve(&todo).unwrap(),
            BindingSource::ExplicitBody { allow_empty: true }
        );
    }

    #[test]
    fn test_conflicting_attributes() {
        let catalog = TypeCatalog::new();
        let cache = CapabilityCache::new(&catalog);

        let id = descriptor(
            &cache,
            "id",
            "i32",
            vec![
                BindingAttribute::Query { name: None },
                BindingAttribute::Route { name: None },
            ],
        );
        assert_eq!(
            resolve(&id).unwrap_err(),
            ResolutionFailure::ConflictingAttributes {
                categories: vec![AttributeCategory::Route, AttributeCategory::Query]
            }
        );
    }

    #[test]
    fn test_explicit_key_and_parser() {
        let catalog = catalog(vec![TypeDecl::record(ty("Tag"))
            .with_member(MemberDecl::new(MemberKind::TryParse))
            .with_member(MemberDecl::new(MemberKind::TryParseWithFormat))]);
        let cache = CapabilityCache::new(&catalog);

        let tag = descriptor(
            &cache,
            "tag",
            "Tag",
            vec![BindingAttribute::Header {
                name: Some("x-tag".to_string()),
            }],
        );
        assert_eq!(
            resolve(&tag).unwrap(),
            BindingSource::ExplicitHeader {
                key: "x-tag".to_string(),
                parser: ValueParser::TryParseWithFormat
            }
        );

        let filter = descriptor(&cache, "filter", "Filter", vec![BindingAttribute::Query { name: None }]);
        assert_eq!(
            resolve(&filter).unwrap(),
            BindingSource::ExplicitQuery {
                key: "filter".to_string(),
                parser: ValueParser::Deserialize
            }
        );
    }

    #[test]
    fn test_framework_types() {
        let catalog = TypeCatalog::new();
        let cache = CapabilityCache::new(&catalog);

        let token = descriptor(&cache, "token", "CancellationToken", vec![]);
        assert_eq!(
            resolve(&token).unwrap(),
            BindingSource::SpecialFrameworkType {
                framework: FrameworkType::CancellationToken
            }
        );
    }

    #[test]
    fn test_binder_with_parameter_dominates_parse() {
        let catalog = catalog(vec![TypeDecl::record(ty("Todo"))
            .with_member(MemberDecl::new(MemberKind::TryParse))
            .with_member(MemberDecl::new(MemberKind::TryParseWithFormat))
            .with_member(MemberDecl::new(MemberKind::Bind))
            .with_member(MemberDecl::new(MemberKind::BindWithParameter))]);
        let cache = CapabilityCache::new(&catalog);

        let todo = descriptor(&cache, "todo", "Todo", vec![]);
        assert_eq!(
            resolve(&todo).unwrap(),
            BindingSource::AsyncBinderWithParameterInfo {
                parameter_name: "todo".to_string()
            }
        );
    }

    #[test]
    fn test_context_binder_dominates_parse() {
        let catalog = catalog(vec![TypeDecl::record(ty("Todo"))
            .with_member(MemberDecl::new(MemberKind::TryParse))
            .with_member(MemberDecl::new(MemberKind::Bind))]);
        let cache = CapabilityCache::new(&catalog);

        let todo = descriptor(&cache, "todo", "Todo", vec![]);
        assert_eq!(resolve(&todo).unwrap(), BindingSource::AsyncBinderContextOnly);
    }

    #[test]
    fn test_parse_tiers() {
        let simple = catalog(vec![
            TypeDecl::record(ty("Todo")).with_member(MemberDecl::new(MemberKind::TryParse))
        ]);
        let cache = CapabilityCache::new(&simple);
        assert_eq!(
            resolve(&descriptor(&cache, "todo", "Todo", vec![])).unwrap(),
            BindingSource::ParseSimple {
                key: "todo".to_string()
            }
        );

        let formatted = catalog(vec![TypeDecl::record(ty("Todo"))
            .with_member(MemberDecl::new(MemberKind::TryParse))
            .with_member(MemberDecl::new(MemberKind::TryParseWithFormat))]);
        let cache = CapabilityCache::new(&formatted);
        assert_eq!(
            resolve(&descriptor(&cache, "todo", "Todo", vec![])).unwrap(),
            BindingSource::ParseWithFormatProvider {
                key: "todo".to_string()
            }
        );
    }

    #[test]
    fn test_wrong_type_binder_never_selected() {
        let catalog = catalog(vec![TypeDecl::record(ty("BindWrongType")).with_member(
            MemberDecl::new(MemberKind::BindWithParameter).binding(BindTarget::Concrete(ty("Todo"))),
        )]);
        let cache = CapabilityCache::new(&catalog);

        let param = descriptor(&cache, "value", "BindWrongType", vec![]);
        assert_eq!(resolve(&param).unwrap(), BindingSource::ImplicitBody);
    }

    #[test]
    fn test_own_binder_beats_interface_default() {
        let catalog = catalog(vec![
            TypeDecl::interface(ty("IBind"))
                .with_member(MemberDecl::new(MemberKind::Bind).binding(BindTarget::TypeArg(0))),
            TypeDecl::record(ty("Widget"))
                .with_interface(GenericRef::with_args(ty("IBind"), vec![ty("Widget")]))
                .with_member(MemberDecl::new(MemberKind::Bind)),
        ]);
        let cache = CapabilityCache::new(&catalog);

        let param = descriptor(&cache, "widget", "Widget", vec![]);
        assert_eq!(resolve(&param).unwrap(), BindingSource::AsyncBinderContextOnly);
    }

    #[test]
    fn test_equal_depth_is_ambiguous() {
        let catalog = catalog(vec![
            TypeDecl::interface(ty("IFirst")).with_member(MemberDecl::new(MemberKind::Bind)),
            TypeDecl::interface(ty("ISecond")).with_member(MemberDecl::new(MemberKind::Bind)),
            TypeDecl::record(ty("Widget"))
                .with_interface(GenericRef::plain(ty("IFirst")))
                .with_interface(GenericRef::plain(ty("ISecond"))),
        ]);
        let cache = CapabilityCache::new(&catalog);

        let param = descriptor(&cache, "widget", "Widget", vec![]);
        let err = resolve(&param).unwrap_err();
        assert_eq!(
            err,
            ResolutionFailure::Ambiguous {
                member: "bind",
                declaring_types: vec![ty("IFirst"), ty("ISecond")]
            }
        );
        assert_eq!(err.to_string(), "`bind` is provided by both `IFirst` and `ISecond`");
    }

    #[test]
    fn test_as_parameters_nested_is_invalid() {
        let catalog = TypeCatalog::new();
        let cache = CapabilityCache::new(&catalog);

        let mut inner = descriptor(&cache, "inner", "Inner", vec![BindingAttribute::AsParameters]);
        inner.fields = FieldExpansion::None;
        let mut outer = descriptor(&cache, "args", "Args", vec![BindingAttribute::AsParameters]);
        outer.fields = FieldExpansion::Expanded(vec![inner]);

        assert!(matches!(
            resolve(&outer).unwrap_err(),
            ResolutionFailure::InvalidAsParameters { .. }
        ));
    }

    #[test]
    fn test_as_parameters_fields_resolve() {
        let catalog = TypeCatalog::new();
        let cache = CapabilityCache::new(&catalog);

        let page = descriptor(&cache, "page", "u32", vec![BindingAttribute::Query { name: None }]);
        let body = descriptor(&cache, "todo", "Todo", vec![]);
        let mut args = descriptor(&cache, "args", "Args", vec![BindingAttribute::AsParameters]);
        args.fields = FieldExpansion::Expanded(vec![page, body]);

        let BindingSource::AsParameters { fields } = resolve(&args).unwrap() else {
            panic!("expected as_parameters binding");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].source, BindingSource::ImplicitBody);
    }
}
