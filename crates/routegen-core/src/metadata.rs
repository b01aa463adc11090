//! Endpoint metadata.
//!
//! Metadata providers are callbacks invoked once per endpoint while it is
//! built. They can only append to a [`MetadataSink`]; entries end up on the
//! endpoint and are emitted into its registration function.

use crate::endpoint::Endpoint;
use serde::{Deserialize, Serialize};

/// One key/value metadata entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Key.
    pub key: String,
    /// Value.
    pub value: String,
}

/// Append-only collection of metadata entries.
#[derive(Debug, Default)]
pub struct MetadataSink {
    entries: Vec<MetadataEntry>,
}

impl MetadataSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(MetadataEntry {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Entries appended so far.
    #[must_use]
    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    /// Consumes the sink.
    #[must_use]
    pub fn into_entries(self) -> Vec<MetadataEntry> {
        self.entries
    }
}

/// A callback that contributes metadata to endpoints.
pub trait MetadataProvider: Send + Sync {
    /// Stable name, part of the cache fingerprint.
    fn name(&self) -> &str;

    /// Appends metadata for `endpoint`.
    fn populate(&self, endpoint: &Endpoint, sink: &mut MetadataSink);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_appends_in_order() {
        let mut sink = MetadataSink::new();
        sink.push("tag", "todos");
        sink.push("tag", "public");

        assert_eq!(sink.entries().len(), 2);
        let entries = sink.into_entries();
        assert_eq!(entries[0].value, "todos");
        assert_eq!(entries[1].value, "public");
    }
}
