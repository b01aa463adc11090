//! Incremental generation cache.
//!
//! Entries are content addressed: an endpoint is stored under a hash of its
//! registration together with the fingerprints of the catalog and of the
//! generator settings that shape endpoints; a thunk is stored under its
//! group key and the runtime path. Entries not used by a pass are evicted
//! at the end of it.

use routegen_core::{Diagnostic, Endpoint, RawRegistration};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

/// Hit and miss counts of one generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Endpoints reused.
    pub endpoint_hits: usize,
    /// Endpoints built.
    pub endpoint_misses: usize,
    /// Thunks reused.
    pub thunk_hits: usize,
    /// Thunks rendered.
    pub thunk_misses: usize,
}

impl CacheStats {
    /// Whether nothing had to be rebuilt.
    #[must_use]
    pub fn all_hits(&self) -> bool {
        self.endpoint_misses == 0 && self.thunk_misses == 0
    }
}

pub(crate) type BuildResult = Result<Endpoint, Diagnostic>;

/// Endpoints and thunks kept between passes.
#[derive(Debug, Default)]
pub struct GenerationCache {
    endpoints: HashMap<String, BuildResult>,
    thunks: HashMap<String, String>,
    used_endpoints: HashSet<String>,
    used_thunks: HashSet<String>,
}

impl GenerationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached endpoints.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Number of cached thunks.
    #[must_use]
    pub fn thunk_count(&self) -> usize {
        self.thunks.len()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.endpoints.clear();
        self.thunks.clear();
        self.used_endpoints.clear();
        self.used_thunks.clear();
    }

    pub(crate) fn endpoint(&self, key: &str) -> Option<&BuildResult> {
        self.endpoints.get(key)
    }

    pub(crate) fn thunk(&self, key: &str) -> Option<&String> {
        self.thunks.get(key)
    }

    pub(crate) fn store_endpoint(&mut self, key: String, built: BuildResult) {
        self.used_endpoints.insert(key.clone());
        self.endpoints.insert(key, built);
    }

    pub(crate) fn store_thunk(&mut self, key: String, text: String) {
        self.used_thunks.insert(key.clone());
        self.thunks.insert(key, text);
    }

    pub(crate) fn touch_endpoint(&mut self, key: &str) {
        self.used_endpoints.insert(key.to_string());
    }

    pub(crate) fn touch_thunk(&mut self, key: &str) {
        self.used_thunks.insert(key.to_string());
    }

    /// Evicts entries the finished pass did not use.
    pub(crate) fn finish_pass(&mut self) {
        let used = std::mem::take(&mut self.used_endpoints);
        self.endpoints.retain(|key, _| used.contains(key));
        let used = std::mem::take(&mut self.used_thunks);
        self.thunks.retain(|key, _| used.contains(key));
    }
}

/// Hex SHA-256 of the JSON rendering of `value`.
pub(crate) fn fingerprint<T: Serialize + ?Sized>(value: &T) -> String {
    // Values reaching here are plain data; serialising them cannot fail.
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    hex::encode(Sha256::digest(&bytes))
}

pub(crate) fn endpoint_key(registration: &RawRegistration, context: &str) -> String {
    fingerprint(&(registration, context))
}

pub(crate) fn thunk_key(group: &str, runtime: &str) -> String {
    fingerprint(&(group, runtime))
}
