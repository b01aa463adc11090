//! Raw registrations and the signature model.
//!
//! A [`RawRegistration`] is what a signature provider hands over: route,
//! verb token and the handler signature as text. Signature extraction turns
//! it into a [`HandlerSignature`] of typed [`ParameterDescriptor`]s and a
//! [`ReturnShape`].

use crate::capability::{CapabilityFlags, TypeCapabilities};
use crate::location::SourceLocation;
use crate::types::{TypeRef, ValueShape};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// HTTP verbs a registration can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
}

impl HttpVerb {
    /// Parses a verb token, ignoring ASCII case.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            _ => None,
        }
    }

    /// Upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An explicit binding-source attribute on a parameter or field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum BindingAttribute {
    /// `#[from_route]`
    Route {
        /// Lookup key, defaults to the parameter name.
        #[serde(default)]
        name: Option<String>,
    },
    /// `#[from_query]`
    Query {
        /// Lookup key, defaults to the parameter name.
        #[serde(default)]
        name: Option<String>,
    },
    /// `#[from_header]`
    Header {
        /// Header name, defaults to the parameter name.
        #[serde(default)]
        name: Option<String>,
    },
    /// `#[from_body]`
    Body {
        /// Whether an empty body is accepted. Unset means "only if optional".
        #[serde(default)]
        allow_empty: Option<bool>,
    },
    /// `#[from_form]`
    Form {
        /// Field name, defaults to the parameter name.
        #[serde(default)]
        name: Option<String>,
    },
    /// `#[from_services]`
    Services,
    /// `#[as_parameters]`
    AsParameters,
}

impl BindingAttribute {
    /// The category this attribute belongs to.
    #[must_use]
    pub const fn category(&self) -> AttributeCategory {
        match self {
            Self::Route { .. } => AttributeCategory::Route,
            Self::Query { .. } => AttributeCategory::Query,
            Self::Header { .. } => AttributeCategory::Header,
            Self::Body { .. } => AttributeCategory::Body,
            Self::Form { .. } => AttributeCategory::Form,
            Self::Services => AttributeCategory::Services,
            Self::AsParameters => AttributeCategory::AsParameters,
        }
    }

    /// Explicit key for key-based attributes.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Route { name } | Self::Query { name } | Self::Header { name } | Self::Form { name } => {
                name.as_deref()
            }
            _ => None,
        }
    }
}

/// Attribute categories, used to detect conflicting attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeCategory {
    /// Route value.
    Route,
    /// Query string.
    Query,
    /// Header.
    Header,
    /// Request body.
    Body,
    /// Form field.
    Form,
    /// Service container.
    Services,
    /// Aggregate of bindable fields.
    AsParameters,
}

impl fmt::Display for AttributeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Route => "from_route",
            Self::Query => "from_query",
            Self::Header => "from_header",
            Self::Body => "from_body",
            Self::Form => "from_form",
            Self::Services => "from_services",
            Self::AsParameters => "as_parameters",
        };
        f.write_str(name)
    }
}

/// One parameter as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawParameter {
    /// Parameter name.
    pub name: String,
    /// Declared type text.
    #[serde(rename = "type")]
    pub ty: String,
    /// Explicit binding attributes.
    #[serde(default)]
    pub attributes: Vec<BindingAttribute>,
    /// Where the parameter is declared.
    #[serde(default)]
    pub location: SourceLocation,
}

/// A handler signature as written in source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawSignature {
    /// Parameters in source order.
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
    /// Return type text; `None` for `()`.
    #[serde(default)]
    pub return_type: Option<String>,
    /// The handler is an `async fn`.
    #[serde(default)]
    pub is_async: bool,
}

/// One route registration handed over by a signature provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRegistration {
    /// Route pattern, opaque to the pipeline.
    pub route: String,
    /// Verb token such as `"get"`.
    pub verb: String,
    /// Path of the handler function.
    pub handler: String,
    /// Handler signature.
    pub signature: RawSignature,
    /// Location of the registration.
    #[serde(default)]
    pub location: SourceLocation,
}

/// Fields of an `as_parameters` aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldExpansion {
    /// The parameter is not an aggregate.
    None,
    /// The aggregate's fields, each described like a parameter.
    Expanded(Vec<ParameterDescriptor>),
    /// The aggregate cannot be expanded.
    Invalid(String),
}

/// Everything the resolver needs to know about one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    /// Name, unique within the signature.
    pub name: String,
    /// Declared type.
    pub ty: TypeRef,
    /// Optional/sequence wrapping of the declared type.
    pub shape: ValueShape,
    /// Declaration site.
    pub location: SourceLocation,
    /// Explicit binding attributes in source order.
    pub attributes: Vec<BindingAttribute>,
    /// Capabilities of `shape.inner`.
    pub capabilities: Arc<TypeCapabilities>,
    /// Fields, for `as_parameters`.
    pub fields: FieldExpansion,
}

impl ParameterDescriptor {
    /// Capability flags of the parameter type.
    #[must_use]
    pub fn flags(&self) -> CapabilityFlags {
        self.capabilities.flags()
    }

    /// Distinct explicit attribute categories, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<AttributeCategory> {
        let mut categories: Vec<_> = self.attributes.iter().map(BindingAttribute::category).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Number of body attributes on this parameter.
    #[must_use]
    pub fn body_attribute_count(&self) -> usize {
        self.attributes
            .iter()
            .filter(|a| a.category() == AttributeCategory::Body)
            .count()
    }

    /// The explicit key, or the parameter name.
    #[must_use]
    pub fn key(&self) -> String {
        self.attributes
            .iter()
            .find_map(BindingAttribute::key)
            .unwrap_or(&self.name)
            .to_string()
    }
}

/// What an awaited handler produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwaitedOutput {
    /// `()`.
    Unit,
    /// A plain value.
    Value(TypeRef),
    /// A value implementing the result capability.
    ResultCapability(TypeRef),
}

/// Return-type shape of a handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnShape {
    /// Returns nothing.
    Void,
    /// Returns a plain value.
    Value(TypeRef),
    /// `async`, or returns a single awaitable.
    Awaitable(AwaitedOutput),
    /// Returns a stream of values.
    Stream(TypeRef),
    /// Returns a value implementing the result capability.
    ResultCapability(TypeRef),
}

impl ReturnShape {
    /// Short name for logs.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Value(_) => "value",
            Self::Awaitable(_) => "awaitable",
            Self::Stream(_) => "stream",
            Self::ResultCapability(_) => "result",
        }
    }

    /// The value type the handler eventually yields, if any.
    #[must_use]
    pub fn value_type(&self) -> Option<&TypeRef> {
        match self {
            Self::Void | Self::Awaitable(AwaitedOutput::Unit) => None,
            Self::Value(ty)
            | Self::Stream(ty)
            | Self::ResultCapability(ty)
            | Self::Awaitable(AwaitedOutput::Value(ty) | AwaitedOutput::ResultCapability(ty)) => Some(ty),
        }
    }
}

/// The signature model of one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSignature {
    /// Route pattern.
    pub route: String,
    /// HTTP verb.
    pub verb: HttpVerb,
    /// Handler path.
    pub handler: String,
    /// Registration site.
    pub location: SourceLocation,
    /// Parameters in source order.
    pub parameters: Vec<ParameterDescriptor>,
    /// Return shape.
    pub return_shape: ReturnShape,
    /// Capabilities of the returned value type, if any.
    pub return_capabilities: Option<Arc<TypeCapabilities>>,
}
