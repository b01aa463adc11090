//! The type catalog.
//!
//! The catalog is the front end's view of the types that appear in handler
//! signatures: their base types, the interfaces (traits) they list, the
//! binder and parse members they declare, and for aggregates the fields
//! that can be bound individually. Capability discovery reads nothing but
//! the catalog.

use crate::error::RoutegenError;
use crate::location::SourceLocation;
use crate::signature::BindingAttribute;
use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// A struct or enum.
    #[default]
    Record,
    /// A trait whose default methods may act as binders.
    Interface,
}

/// A binder, parse, or metadata member a type can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// `bind_with_parameter(ctx, parameter)`.
    BindWithParameter,
    /// `bind(ctx)`.
    Bind,
    /// `try_parse_with_format(value, format)`.
    TryParseWithFormat,
    /// `try_parse(value)`.
    TryParse,
    /// A `FromStr` implementation.
    FromStr,
    /// `populate_metadata(metadata)`.
    PopulateMetadata,
}

impl MemberKind {
    /// Method name used in source and in emitted code.
    #[must_use]
    pub const fn method_name(self) -> &'static str {
        match self {
            Self::BindWithParameter => "bind_with_parameter",
            Self::Bind => "bind",
            Self::TryParseWithFormat => "try_parse_with_format",
            Self::TryParse => "try_parse",
            Self::FromStr => "from_str",
            Self::PopulateMetadata => "populate_metadata",
        }
    }
}

/// The type a member produces.
///
/// A binder only applies to a parameter whose type equals the bound type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindTarget {
    /// The declaring type, or the implementing type for interface members.
    #[default]
    SelfType,
    /// A fixed type.
    Concrete(TypeRef),
    /// The n-th generic argument of the reference to the declaring type.
    TypeArg(usize),
}

/// A member declared on a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberDecl {
    /// What the member does.
    pub kind: MemberKind,
    /// What it produces.
    #[serde(default)]
    pub binds: BindTarget,
}

impl MemberDecl {
    /// Creates a member bound to its declaring type.
    #[must_use]
    pub fn new(kind: MemberKind) -> Self {
        Self {
            kind,
            binds: BindTarget::SelfType,
        }
    }

    /// Sets the bound type.
    #[must_use]
    pub fn binding(mut self, binds: BindTarget) -> Self {
        self.binds = binds;
        self
    }
}

/// A reference to a possibly generic type, as used for bases and interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenericRef {
    /// Identity of the referenced declaration.
    pub name: TypeRef,
    /// Generic arguments supplied by the reference.
    #[serde(default)]
    pub args: Vec<TypeRef>,
}

impl GenericRef {
    /// A reference without generic arguments.
    #[must_use]
    pub fn plain(name: TypeRef) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// A reference with generic arguments.
    #[must_use]
    pub fn with_args(name: TypeRef, args: Vec<TypeRef>) -> Self {
        Self { name, args }
    }
}

/// A bindable field of an aggregate used with `as_parameters`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Declared type text.
    pub ty: String,
    /// Binding attributes on the field.
    #[serde(default)]
    pub attributes: Vec<BindingAttribute>,
    /// Where the field is declared.
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

/// A declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Identity of the type.
    pub name: TypeRef,
    /// Record or interface.
    #[serde(default)]
    pub kind: TypeKind,
    /// Base type, if any.
    #[serde(default)]
    pub base: Option<GenericRef>,
    /// Listed interfaces.
    #[serde(default)]
    pub interfaces: Vec<GenericRef>,
    /// Declared members.
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    /// Bindable fields.
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Declaration site.
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

impl TypeDecl {
    /// A record type with nothing declared.
    #[must_use]
    pub fn record(name: TypeRef) -> Self {
        Self {
            name,
            kind: TypeKind::Record,
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            fields: Vec::new(),
            location: None,
        }
    }

    /// An interface with nothing declared.
    #[must_use]
    pub fn interface(name: TypeRef) -> Self {
        Self {
            kind: TypeKind::Interface,
            ..Self::record(name)
        }
    }

    /// Adds a member.
    #[must_use]
    pub fn with_member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    /// Lists an interface.
    #[must_use]
    pub fn with_interface(mut self, interface: GenericRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Sets the base type.
    #[must_use]
    pub fn with_base(mut self, base: GenericRef) -> Self {
        self.base = Some(base);
        self
    }

    /// Adds a bindable field.
    #[must_use]
    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Merges members, interfaces and fields from another declaration of the
    /// same type. Used by providers that see a type across several items.
    pub fn merge(&mut self, other: TypeDecl) {
        if self.base.is_none() {
            self.base = other.base;
        }
        if self.location.is_none() {
            self.location = other.location;
        }
        for interface in other.interfaces {
            if !self.interfaces.contains(&interface) {
                self.interfaces.push(interface);
            }
        }
        for member in other.members {
            if !self.members.contains(&member) {
                self.members.push(member);
            }
        }
        self.fields.extend(other.fields);
    }
}

/// All declared types, keyed by identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TypeDecl>", into = "Vec<TypeDecl>")]
pub struct TypeCatalog {
    types: BTreeMap<TypeRef, TypeDecl>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a declaration, rejecting duplicates.
    pub fn insert(&mut self, decl: TypeDecl) -> Result<(), RoutegenError> {
        if self.types.contains_key(&decl.name) {
            return Err(RoutegenError::DuplicateType(decl.name.to_string()));
        }
        self.types.insert(decl.name.clone(), decl);
        Ok(())
    }

    /// Inserts a declaration, merging it into an existing one.
    pub fn upsert(&mut self, decl: TypeDecl) {
        match self.types.get_mut(&decl.name) {
            Some(existing) => existing.merge(decl),
            None => {
                self.types.insert(decl.name.clone(), decl);
            }
        }
    }

    /// Looks up a type by identity.
    #[must_use]
    pub fn get(&self, name: &TypeRef) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    /// Iterates declarations in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.values()
    }

    /// Number of declared types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` when nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TryFrom<Vec<TypeDecl>> for TypeCatalog {
    type Error = RoutegenError;

    fn try_from(decls: Vec<TypeDecl>) -> Result<Self, Self::Error> {
        let mut catalog = Self::new();
        for decl in decls {
            catalog.insert(decl)?;
        }
        Ok(catalog)
    }
}

impl From<TypeCatalog> for Vec<TypeDecl> {
    fn from(catalog: TypeCatalog) -> Self {
        catalog.types.into_values().collect()
    }
}

/// Names of the runtime traits and primitive types the resolver knows about.
pub mod well_known {
    use super::MemberKind;
    use crate::types::TypeRef;

    /// Binder trait taking the context and the parameter metadata.
    pub const BIND_WITH_PARAMETER: &str = "BindWithParameter";
    /// Binder trait taking only the context.
    pub const BIND_FROM_CONTEXT: &str = "BindFromContext";
    /// Simple parse trait.
    pub const TRY_PARSE: &str = "TryParse";
    /// Parse trait taking a format provider.
    pub const TRY_PARSE_WITH_FORMAT: &str = "TryParseWithFormat";
    /// Standard string conversion.
    pub const FROM_STR: &str = "FromStr";
    /// Endpoint metadata trait.
    pub const METADATA_PROVIDER: &str = "EndpointMetadataProvider";
    /// Result capability trait.
    pub const RESULT_CAPABILITY: &str = "IntoDispatchResult";

    /// Types that convert from a string without catalog entries.
    const SIMPLE_TYPES: &[&str] = &[
        "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
        "u128", "usize", "f32", "f64", "String", "std::string::String", "IpAddr",
        "std::net::IpAddr", "Ipv4Addr", "std::net::Ipv4Addr", "Ipv6Addr", "std::net::Ipv6Addr",
        "Uuid", "uuid::Uuid",
    ];

    /// Returns the member a runtime trait implies on its implementor.
    #[must_use]
    pub fn implied_member(trait_name: &TypeRef) -> Option<MemberKind> {
        match trait_name.base_name() {
            BIND_WITH_PARAMETER => Some(MemberKind::BindWithParameter),
            BIND_FROM_CONTEXT => Some(MemberKind::Bind),
            TRY_PARSE => Some(MemberKind::TryParse),
            TRY_PARSE_WITH_FORMAT => Some(MemberKind::TryParseWithFormat),
            FROM_STR => Some(MemberKind::FromStr),
            METADATA_PROVIDER => Some(MemberKind::PopulateMetadata),
            _ => None,
        }
    }

    /// Returns `true` for the binder traits.
    #[must_use]
    pub fn is_binder_interface(trait_name: &TypeRef) -> bool {
        matches!(trait_name.base_name(), BIND_WITH_PARAMETER | BIND_FROM_CONTEXT)
    }

    /// Returns `true` for the result capability trait.
    #[must_use]
    pub fn is_result_capability(trait_name: &TypeRef) -> bool {
        trait_name.base_name() == RESULT_CAPABILITY
    }

    /// Returns `true` for primitives and standard string-convertible types.
    #[must_use]
    pub fn is_builtin_simple(ty: &TypeRef) -> bool {
        SIMPLE_TYPES.contains(&ty.as_str())
    }

    /// Returns `true` for `String` in its bare or qualified form.
    #[must_use]
    pub fn is_string(ty: &TypeRef) -> bool {
        matches!(ty.as_str(), "String" | "std::string::String")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut catalog = TypeCatalog::new();
        catalog
            .insert(TypeDecl::record(ty("Todo")).with_member(MemberDecl::new(MemberKind::TryParse)))
            .unwrap();

        let decl = catalog.get(&ty("Todo")).unwrap();
        assert_eq!(decl.members.len(), 1);
        assert!(catalog.get(&ty("Other")).is_none());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut catalog = TypeCatalog::new();
        catalog.insert(TypeDecl::record(ty("Todo"))).unwrap();
        let err = catalog.insert(TypeDecl::record(ty("Todo"))).unwrap_err();
        assert!(matches!(err, RoutegenError::DuplicateType(_)));
    }

    #[test]
    fn test_upsert_merges() {
        let mut catalog = TypeCatalog::new();
        catalog.upsert(TypeDecl::record(ty("Todo")).with_member(MemberDecl::new(MemberKind::Bind)));
        catalog.upsert(
            TypeDecl::record(ty("Todo"))
                .with_member(MemberDecl::new(MemberKind::Bind))
                .with_member(MemberDecl::new(MemberKind::TryParse))
                .with_interface(GenericRef::plain(ty("BindFromContext"))),
        );

        let decl = catalog.get(&ty("Todo")).unwrap();
        assert_eq!(decl.members.len(), 2);
        assert_eq!(decl.interfaces.len(), 1);
    }

    #[test]
    fn test_deserialize_catalog() {
        let json = r#"[
            {
                "name": "Todo",
                "members": [{ "kind": "try_parse" }],
                "interfaces": [{ "name": "IBind", "args": ["Todo"] }]
            },
            {
                "name": "IBind",
                "kind": "interface",
                "members": [{ "kind": "bind", "binds": { "type_arg": 0 } }]
            }
        ]"#;
        let catalog: TypeCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let interface = catalog.get(&ty("IBind")).unwrap();
        assert_eq!(interface.kind, TypeKind::Interface);
        assert_eq!(interface.members[0].binds, BindTarget::TypeArg(0));
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let json = r#"[{ "name": "Todo" }, { "name": "Todo" }]"#;
        assert!(serde_json::from_str::<TypeCatalog>(json).is_err());
    }

    #[test]
    fn test_well_known() {
        assert_eq!(
            well_known::implied_member(&ty("routegen_runtime::BindWithParameter")),
            Some(MemberKind::BindWithParameter)
        );
        assert_eq!(
            well_known::implied_member(&ty("std::str::FromStr")),
            Some(MemberKind::FromStr)
        );
        assert!(well_known::is_binder_interface(&ty("BindFromContext")));
        assert!(well_known::is_builtin_simple(&ty("u64")));
        assert!(well_known::is_string(&ty("std::string::String")));
        assert!(!well_known::is_builtin_simple(&ty("Todo")));
    }
}
