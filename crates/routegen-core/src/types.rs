//! Type identities and value shapes.
//!
//! A [`TypeRef`] is the canonical textual identity of a Rust type. Two
//! parameters refer to the same type exactly when their `TypeRef`s are equal;
//! there is no structural or nominal matching beyond that.

use crate::error::RoutegenError;
use quote::ToTokens;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity of a type.
///
/// The canonical form is the token rendering of the parsed type with the
/// spacing around `<`, `>`, `::`, `,` and `&` normalised, so that
/// `Option < Vec<i32> >` and `Option<Vec<i32>>` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef(String);

impl TypeRef {
    /// Parses type text into its canonical identity.
    pub fn parse(text: &str) -> Result<Self, RoutegenError> {
        let ty: syn::Type = syn::parse_str(text)
            .map_err(|e| RoutegenError::invalid_type(text, e.to_string()))?;
        Ok(Self::from_syn(&ty))
    }

    /// Builds the identity of an already parsed type.
    #[must_use]
    pub fn from_syn(ty: &syn::Type) -> Self {
        Self(compact(&ty.to_token_stream().to_string()))
    }

    /// Returns the canonical text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the canonical text back into a `syn` type.
    pub fn to_syn(&self) -> Result<syn::Type, RoutegenError> {
        syn::parse_str(&self.0).map_err(|e| RoutegenError::invalid_type(&self.0, e.to_string()))
    }

    /// Returns the last path segment without generic arguments.
    ///
    /// `crate::models::Todo` yields `Todo`, `Vec<i32>` yields `Vec`.
    #[must_use]
    pub fn base_name(&self) -> &str {
        let head = self.0.split('<').next().unwrap_or(&self.0);
        head.rsplit("::").next().unwrap_or(head).trim()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = RoutegenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.0
    }
}

fn compact(rendered: &str) -> String {
    let mut out = String::with_capacity(rendered.len());
    let mut prev: Option<&str> = None;
    for token in rendered.split_whitespace() {
        if let Some(prev) = prev {
            let glued = matches!(token, "<" | ">" | "," | "::" | ">>")
                || matches!(prev, "<" | "::" | "&");
            if !glued {
                out.push(' ');
            }
        }
        out.push_str(token);
        prev = Some(token);
    }
    out
}

/// How a declared parameter type wraps the type whose capabilities matter.
///
/// `Option<T>` is optional, `Vec<T>` is a sequence, and `Option<Vec<T>>` is
/// both. Capability discovery always looks at `inner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueShape {
    /// The declared type is `Option<_>`.
    pub optional: bool,
    /// The declared type (after `Option`) is `Vec<_>`.
    pub sequence: bool,
    /// The unwrapped type.
    pub inner: TypeRef,
}

impl ValueShape {
    /// Computes the shape of a declared type.
    #[must_use]
    pub fn of(ty: &syn::Type) -> Self {
        let (optional, rest) = match single_generic_arg(ty, "Option") {
            Some(inner) => (true, inner),
            None => (false, ty),
        };
        let (sequence, inner) = match single_generic_arg(rest, "Vec") {
            Some(inner) => (true, inner),
            None => (false, rest),
        };
        Self {
            optional,
            sequence,
            inner: TypeRef::from_syn(inner),
        }
    }
}

/// Returns the single type argument of `ty` when its last path segment is
/// `wrapper`.
#[must_use]
pub fn single_generic_arg<'a>(ty: &'a syn::Type, wrapper: &str) -> Option<&'a syn::Type> {
    let args = generic_args(ty, wrapper)?;
    match args.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Returns the type arguments of `ty` when its last path segment is
/// `wrapper`.
#[must_use]
pub fn generic_args<'a>(ty: &'a syn::Type, wrapper: &str) -> Option<Vec<&'a syn::Type>> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    Some(
        args.args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
    )
}
