//! Binding sources.
//!
//! A [`BindingSource`] records where a parameter's runtime value comes from
//! together with the static arguments the emitted extraction code needs.
//! The enum is closed; every consumer matches it exhaustively.

use crate::types::{TypeRef, ValueShape};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a string value is converted to the parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueParser {
    /// The parameter is a `String`.
    Identity,
    /// `FromStr`.
    FromStr,
    /// `TryParse::try_parse`.
    TryParse,
    /// `TryParseWithFormat::try_parse_with_format`.
    TryParseWithFormat,
    /// The whole source map is deserialised into the type.
    Deserialize,
}

/// Framework types bound without any lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkType {
    /// The request context itself.
    RequestContext,
    /// The request's cancellation token.
    CancellationToken,
    /// The authenticated principal.
    Principal,
    /// The request headers.
    HeaderMap,
    /// The unparsed request body.
    RawBody,
}

impl FrameworkType {
    const ALL: [Self; 5] = [
        Self::RequestContext,
        Self::CancellationToken,
        Self::Principal,
        Self::HeaderMap,
        Self::RawBody,
    ];

    /// Identities that denote this framework type.
    #[must_use]
    pub const fn identities(self) -> &'static [&'static str] {
        match self {
            Self::RequestContext => &["RequestContext", "routegen_runtime::RequestContext"],
            Self::CancellationToken => &[
                "CancellationToken",
                "routegen_runtime::CancellationToken",
                "tokio_util::sync::CancellationToken",
            ],
            Self::Principal => &["Principal", "routegen_runtime::Principal"],
            Self::HeaderMap => &["HeaderMap", "http::HeaderMap"],
            Self::RawBody => &["Bytes", "bytes::Bytes"],
        }
    }

    /// Matches a declared type by exact identity.
    #[must_use]
    pub fn from_type(ty: &TypeRef) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|framework| framework.identities().contains(&ty.as_str()))
    }
}

/// A bound field of an `as_parameters` aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldBinding {
    /// Field name.
    pub name: String,
    /// Declared field type.
    pub ty: TypeRef,
    /// Optional/sequence wrapping.
    pub shape: ValueShape,
    /// Where the field's value comes from.
    pub source: BindingSource,
}

/// Where a parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum BindingSource {
    /// `#[from_route]`.
    ExplicitRoute {
        /// Route value name.
        key: String,
        /// Conversion.
        parser: ValueParser,
    },
    /// `#[from_query]`.
    ExplicitQuery {
        /// Query key.
        key: String,
        /// Conversion.
        parser: ValueParser,
    },
    /// `#[from_header]`.
    ExplicitHeader {
        /// Header name.
        key: String,
        /// Conversion.
        parser: ValueParser,
    },
    /// `#[from_body]`.
    ExplicitBody {
        /// Whether an empty body yields the default instead of an error.
        allow_empty: bool,
    },
    /// `#[from_form]`.
    ExplicitForm {
        /// Form field name.
        key: String,
        /// Conversion.
        parser: ValueParser,
    },
    /// `#[from_services]`.
    ExplicitServices,
    /// `#[as_parameters]`.
    AsParameters {
        /// Field bindings in declaration order.
        fields: Vec<FieldBinding>,
    },
    /// `bind_with_parameter(ctx, parameter)`.
    AsyncBinderWithParameterInfo {
        /// Name handed to the binder.
        parameter_name: String,
    },
    /// `bind(ctx)`.
    AsyncBinderContextOnly,
    /// Route-or-query value through `try_parse_with_format`.
    ParseWithFormatProvider {
        /// Lookup key.
        key: String,
    },
    /// Route-or-query value through `try_parse`.
    ParseSimple {
        /// Lookup key.
        key: String,
    },
    /// JSON body, inferred.
    ImplicitBody,
    /// Route value, or query value when the route has none.
    ImplicitRouteOrQuery {
        /// Lookup key.
        key: String,
        /// Conversion.
        parser: ValueParser,
    },
    /// A framework type.
    SpecialFrameworkType {
        /// Which one.
        framework: FrameworkType,
    },
}

impl BindingSource {
    /// Variant name for logs and messages.
    #[must_use]
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::ExplicitRoute { .. } => "ExplicitRoute",
            Self::ExplicitQuery { .. } => "ExplicitQuery",
            Self::ExplicitHeader { .. } => "ExplicitHeader",
            Self::ExplicitBody { .. } => "ExplicitBody",
            Self::ExplicitForm { .. } => "ExplicitForm",
            Self::ExplicitServices => "ExplicitServices",
            Self::AsParameters { .. } => "AsParameters",
            Self::AsyncBinderWithParameterInfo { .. } => "AsyncBinderWithParameterInfo",
            Self::AsyncBinderContextOnly => "AsyncBinderContextOnly",
            Self::ParseWithFormatProvider { .. } => "ParseWithFormatProvider",
            Self::ParseSimple { .. } => "ParseSimple",
            Self::ImplicitBody => "ImplicitBody",
            Self::ImplicitRouteOrQuery { .. } => "ImplicitRouteOrQuery",
            Self::SpecialFrameworkType { .. } => "SpecialFrameworkType",
        }
    }

    /// Returns `true` if the value is read from the request body.
    #[must_use]
    pub const fn is_body(&self) -> bool {
        matches!(self, Self::ExplicitBody { .. } | Self::ImplicitBody)
    }

    /// Returns `true` for sources chosen by an explicit attribute.
    #[must_use]
    pub const fn is_explicit(&self) -> bool {
        matches!(
            self,
            Self::ExplicitRoute { .. }
                | Self::ExplicitQuery { .. }
                | Self::ExplicitHeader { .. }
                | Self::ExplicitBody { .. }
                | Self::ExplicitForm { .. }
                | Self::ExplicitServices
                | Self::AsParameters { .. }
        )
    }
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variant_name())
    }
}
