//! Source locations.
//!
//! Locations are used for reporting and for the stable ordering of
//! endpoints and diagnostics. They never take part in dispatch shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a source file.
///
/// Ordering is lexicographic over `(file, line, column)`, which is the
/// stable source order used throughout the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File path as reported by the signature provider.
    pub file: String,
    /// One-based line.
    pub line: u32,
    /// One-based column.
    pub column: u32,
}

impl SourceLocation {
    /// Creates a new location.
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
