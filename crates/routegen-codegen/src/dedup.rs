//! Deduplication by dispatch shape.
//!
//! Two endpoints share a thunk when their parameters have the same declared
//! types and binding sources in the same order and their return shapes are
//! equal. Binder extractions report a missing value under the parameter's
//! name, so for those parameters the name is part of the shape too. Route
//! and verb never take part. The group key is a content hash of
//! the shape, so it is the same in every pass that sees the same shape.

use crate::extraction::names_parameter;
use indexmap::IndexMap;
use routegen_core::{BindingSource, Endpoint, ReturnShape, RoutegenError, TypeRef};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Serialize)]
struct ShapeKey<'a> {
    parameters: Vec<ShapeParameter<'a>>,
    return_shape: &'a ReturnShape,
}

#[derive(Serialize)]
struct ShapeParameter<'a> {
    ty: &'a TypeRef,
    binding: &'a BindingSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// Content-addressed identity of a dispatch shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey(String);

impl GroupKey {
    /// Computes the key of an endpoint's shape.
    ///
    /// Returns `Ok(None)` when a parameter is unresolved.
    pub fn of(endpoint: &Endpoint) -> Result<Option<Self>, RoutegenError> {
        let mut parameters = Vec::with_capacity(endpoint.parameters.len());
        for parameter in &endpoint.parameters {
            let Some(binding) = &parameter.binding else {
                return Ok(None);
            };
            parameters.push(ShapeParameter {
                ty: &parameter.descriptor.ty,
                binding,
                name: names_parameter(binding).then_some(parameter.descriptor.name.as_str()),
            });
        }
        let key = ShapeKey {
            parameters,
            return_shape: &endpoint.return_shape,
        };
        let canonical = serde_json::to_vec(&key)
            .map_err(|e| RoutegenError::codegen(format!("cannot encode shape key: {e}")))?;
        let digest = Sha256::digest(&canonical);
        let mut hex = hex::encode(digest);
        hex.truncate(16);
        Ok(Some(Self(hex)))
    }

    /// The hex digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Endpoints sharing one thunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThunkGroup {
    /// Shape identity.
    pub key: GroupKey,
    /// Index of the first member in stable order.
    pub representative: usize,
    /// Indices of all members, in stable order.
    pub members: Vec<usize>,
}

/// Indices of `endpoints` in stable source order.
///
/// Orders by registration location, ties broken by input position.
#[must_use]
pub fn stable_order(endpoints: &[Endpoint]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..endpoints.len()).collect();
    order.sort_by(|a, b| {
        endpoints[*a]
            .location
            .cmp(&endpoints[*b].location)
            .then(a.cmp(b))
    });
    order
}

/// Partitions diagnostic-free endpoints into thunk groups.
///
/// `endpoints` must already be in stable order; groups come out in order of
/// first appearance. Endpoints with error diagnostics are skipped.
pub fn partition(endpoints: &[Endpoint]) -> Result<Vec<ThunkGroup>, RoutegenError> {
    let mut groups: IndexMap<GroupKey, ThunkGroup> = IndexMap::new();
    for (index, endpoint) in endpoints.iter().enumerate() {
        if endpoint.has_errors() {
            continue;
        }
        let Some(key) = GroupKey::of(endpoint)? else {
            continue;
        };
        groups
            .entry(key.clone())
            .or_insert_with(|| ThunkGroup {
                key,
                representative: index,
                members: Vec::new(),
            })
            .members
            .push(index);
    }
    tracing::debug!(
        endpoints = endpoints.len(),
        groups = groups.len(),
        "partitioned endpoints by dispatch shape"
    );
    Ok(groups.into_values().collect())
}
