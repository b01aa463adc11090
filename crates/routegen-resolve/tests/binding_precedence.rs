//! Binding precedence over realistic catalogs.
//!
//! Each test builds a full endpoint from a raw registration and checks the
//! binding chosen for every parameter together with the diagnostics.

use routegen_core::{
    BindTarget, BindingAttribute, BindingSource, DiagnosticKind, Endpoint, GenericRef,
    MemberDecl, MemberKind, RawParameter, RawRegistration, RawSignature, Severity,
    SourceLocation, TypeCatalog, TypeDecl, TypeRef, ValueParser,
};
use proptest::prelude::*;
use routegen_resolve::{CapabilityCache, EndpointBuilder};

fn ty(text: &str) -> TypeRef {
    TypeRef::parse(text).unwrap()
}

fn fixture_catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    let decls = vec![
        // bind_with_parameter and bind on the same type
        TypeDecl::record(ty("MyBindAsyncRecord"))
            .with_member(MemberDecl::new(MemberKind::BindWithParameter))
            .with_member(MemberDecl::new(MemberKind::Bind)),
        // binder plus parse members
        TypeDecl::record(ty("MyBothBindAsyncAndTryParseRecord"))
            .with_member(MemberDecl::new(MemberKind::Bind))
            .with_member(MemberDecl::new(MemberKind::TryParse)),
        // generic base binder
        TypeDecl::record(ty("BaseBindAsync"))
            .with_member(MemberDecl::new(MemberKind::BindWithParameter).binding(BindTarget::TypeArg(0))),
        TypeDecl::record(ty("InheritBindAsync"))
            .with_base(GenericRef::with_args(ty("BaseBindAsync"), vec![ty("InheritBindAsync")])),
        // interface default binder
        TypeDecl::interface(ty("IBindAsync"))
            .with_member(MemberDecl::new(MemberKind::Bind).binding(BindTarget::TypeArg(0))),
        TypeDecl::record(ty("BindAsyncFromImplicitStaticAbstractInterface"))
            .with_interface(GenericRef::with_args(
                ty("IBindAsync"),
                vec![ty("BindAsyncFromImplicitStaticAbstractInterface")],
            )),
        // wrong-type binders
        TypeDecl::record(ty("BindAsyncWrongType")).with_member(
            MemberDecl::new(MemberKind::BindWithParameter)
                .binding(BindTarget::Concrete(ty("MyBindAsyncRecord"))),
        ),
        TypeDecl::record(ty("InheritBindAsyncWrongType"))
            .with_base(GenericRef::with_args(ty("BaseBindAsync"), vec![ty("MyBindAsyncRecord")])),
        TypeDecl::record(ty("BindAsyncFromStaticAbstractInterfaceWrongType"))
            .with_interface(GenericRef::with_args(ty("IBindAsync"), vec![ty("MyBindAsyncRecord")])),
        // parse overloads
        TypeDecl::record(ty("MyTryParseRecord")).with_member(MemberDecl::new(MemberKind::TryParse)),
        TypeDecl::record(ty("MyFormattedRecord"))
            .with_member(MemberDecl::new(MemberKind::TryParse))
            .with_member(MemberDecl::new(MemberKind::TryParseWithFormat)),
        // string convertible enum
        TypeDecl::record(ty("TodoStatus")).with_interface(GenericRef::plain(ty("FromStr"))),
    ];
    for decl in decls {
        catalog.insert(decl).unwrap();
    }
    catalog
}

fn build(catalog: &TypeCatalog, params: &[(&str, &str, Vec<BindingAttribute>)]) -> Endpoint {
    let cache = CapabilityCache::new(catalog);
    let builder = EndpointBuilder::new(&cache, &[]);
    let parameters = params
        .iter()
        .enumerate()
        .map(|(index, (name, ty, attributes))| RawParameter {
            name: (*name).to_string(),
            ty: (*ty).to_string(),
            attributes: attributes.clone(),
            location: SourceLocation::new("endpoints.rs", 5, 10 + u32::try_from(index).unwrap() * 20),
        })
        .collect();
    builder
        .build(&RawRegistration {
            route: "/".to_string(),
            verb: "GET".to_string(),
            handler: "handle".to_string(),
            signature: RawSignature {
                parameters,
                return_type: Some("String".to_string()),
                is_async: false,
            },
            location: SourceLocation::new("endpoints.rs", 5, 1),
        })
        .unwrap()
}

fn only_binding(endpoint: &Endpoint) -> &BindingSource {
    endpoint.parameters[0].binding.as_ref().unwrap()
}

#[test]
fn test_binder_with_parameter_preferred_over_context_binder() {
    let catalog = fixture_catalog();
    let endpoint = build(&catalog, &[("record", "MyBindAsyncRecord", vec![])]);
    assert_eq!(
        only_binding(&endpoint),
        &BindingSource::AsyncBinderWithParameterInfo {
            parameter_name: "record".to_string()
        }
    );
    let hints: Vec<_> = endpoint
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnreachableBinder)
        .collect();
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].severity, Severity::Hint);
}

#[test]
fn test_binder_preferred_over_try_parse() {
    let catalog = fixture_catalog();
    let endpoint = build(&catalog, &[("record", "MyBothBindAsyncAndTryParseRecord", vec![])]);
    assert_eq!(only_binding(&endpoint), &BindingSource::AsyncBinderContextOnly);
    assert!(!endpoint.has_errors());
}

#[test]
fn test_base_class_binder() {
    let catalog = fixture_catalog();
    let endpoint = build(&catalog, &[("value", "InheritBindAsync", vec![])]);
    assert_eq!(
        only_binding(&endpoint),
        &BindingSource::AsyncBinderWithParameterInfo {
            parameter_name: "value".to_string()
        }
    );
}

#[test]
fn test_interface_default_binder() {
    let catalog = fixture_catalog();
    let endpoint = build(&catalog, &[("value", "BindAsyncFromImplicitStaticAbstractInterface", vec![])]);
    assert_eq!(only_binding(&endpoint), &BindingSource::AsyncBinderContextOnly);
}

#[test]
fn test_wrong_type_binders_never_selected() {
    let catalog = fixture_catalog();
    for wrong in [
        "BindAsyncWrongType",
        "InheritBindAsyncWrongType",
        "BindAsyncFromStaticAbstractInterfaceWrongType",
    ] {
        let endpoint = build(&catalog, &[("value", wrong, vec![])]);
        assert_eq!(only_binding(&endpoint), &BindingSource::ImplicitBody, "{wrong}");
        assert!(endpoint
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::UnreachableBinder));
        assert!(!endpoint.diagnostics.is_empty(), "{wrong}");
    }
}

#[test]
fn test_parse_overloads() {
    let catalog = fixture_catalog();
    let endpoint = build(&catalog, &[("value", "MyTryParseRecord", vec![])]);
    assert_eq!(
        only_binding(&endpoint),
        &BindingSource::ParseSimple {
            key: "value".to_string()
        }
    );

    let endpoint = build(&catalog, &[("value", "MyFormattedRecord", vec![])]);
    assert_eq!(
        only_binding(&endpoint),
        &BindingSource::ParseWithFormatProvider {
            key: "value".to_string()
        }
    );
    assert_eq!(endpoint.diagnostics.len(), 1);
    assert!(endpoint.diagnostics[0].message.contains("try_parse_with_format"));
}

#[test]
fn test_string_convertible_enum_and_sequences() {
    let catalog = fixture_catalog();
    let endpoint = build(
        &catalog,
        &[
            ("status", "TodoStatus", vec![]),
            ("ids", "Vec<i64>", vec![BindingAttribute::Query { name: Some("id".to_string()) }]),
        ],
    );
    let bindings: Vec<_> = endpoint.bindings().map(Option::unwrap).collect();
    assert_eq!(
        bindings,
        vec![
            &BindingSource::ImplicitRouteOrQuery {
                key: "status".to_string(),
                parser: ValueParser::FromStr
            },
            &BindingSource::ExplicitQuery {
                key: "id".to_string(),
                parser: ValueParser::FromStr
            },
        ]
    );
    assert!(endpoint.diagnostics.is_empty());
}

#[test]
fn test_two_explicit_bodies() {
    let catalog = fixture_catalog();
    let body = || vec![BindingAttribute::Body { allow_empty: None }];
    let endpoint = build(&catalog, &[("a", "Product", body()), ("b", "Product", body())]);

    let body_diagnostics: Vec<_> = endpoint
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::AtMostOneFromBodyAttribute)
        .collect();
    assert_eq!(body_diagnostics.len(), 2);
    assert_ne!(body_diagnostics[0].location, body_diagnostics[1].location);
    assert!(endpoint
        .bindings()
        .all(|b| b == Some(&BindingSource::ExplicitBody { allow_empty: false })));
}

const NON_BODY_TYPES: [&str; 7] = [
    "MyBindAsyncRecord",
    "InheritBindAsync",
    "MyTryParseRecord",
    "MyFormattedRecord",
    "TodoStatus",
    "i32",
    "Option<String>",
];

proptest! {
    #[test]
    fn test_binding_independent_of_sibling_parameters(
        order in Just((0..NON_BODY_TYPES.len()).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let catalog = fixture_catalog();
        let names: Vec<String> = (0..NON_BODY_TYPES.len()).map(|i| format!("p{i}")).collect();
        let params: Vec<(&str, &str, Vec<BindingAttribute>)> = order
            .iter()
            .map(|i| (names[*i].as_str(), NON_BODY_TYPES[*i], Vec::new()))
            .collect();
        let together = build(&catalog, &params);

        for (position, index) in order.iter().enumerate() {
            let alone = build(&catalog, &[(names[*index].as_str(), NON_BODY_TYPES[*index], Vec::new())]);
            prop_assert_eq!(
                together.parameters[position].binding.as_ref(),
                Some(only_binding(&alone))
            );
        }
    }
}
