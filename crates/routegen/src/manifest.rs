//! JSON manifest signature provider.

use routegen_core::{RawRegistration, RoutegenResult, SignatureProvider, TypeCatalog};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Registrations and catalog read from a JSON document.
///
/// ```json
/// {
///   "registrations": [
///     {
///       "route": "/todos/{id}",
///       "verb": "GET",
///       "handler": "todos::get",
///       "signature": {
///         "parameters": [{ "name": "id", "type": "i32" }],
///         "return_type": "Todo",
///         "is_async": true
///       },
///       "location": { "file": "src/todos.rs", "line": 12, "column": 5 }
///     }
///   ],
///   "catalog": [
///     { "name": "Todo", "members": [{ "kind": "try_parse" }] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestProvider {
    #[serde(default)]
    registrations: Vec<RawRegistration>,
    #[serde(default)]
    catalog: TypeCatalog,
}

impl ManifestProvider {
    /// Creates a provider from parts.
    #[must_use]
    pub fn new(registrations: Vec<RawRegistration>, catalog: TypeCatalog) -> Self {
        Self {
            registrations,
            catalog,
        }
    }

    /// Parses a manifest document.
    ///
    /// # Errors
    ///
    /// Returns `RoutegenError::Manifest` if the text is not a valid manifest,
    /// including a catalog that declares a type twice.
    pub fn from_json(text: &str) -> RoutegenResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a manifest document.
    ///
    /// # Errors
    ///
    /// Same as [`from_json`](Self::from_json); read failures are reported
    /// the same way.
    pub fn from_reader(reader: impl Read) -> RoutegenResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serialises the manifest.
    ///
    /// # Errors
    ///
    /// Returns `RoutegenError::Manifest` if serialisation fails.
    pub fn to_json(&self) -> RoutegenResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl SignatureProvider for ManifestProvider {
    fn registrations(&self) -> &[RawRegistration] {
        &self.registrations
    }

    fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }
}
