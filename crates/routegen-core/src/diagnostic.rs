//! Diagnostics.
//!
//! Every problem with an individual registration is a [`Diagnostic`]: a kind
//! with a stable code, a severity, the location it applies to, and a
//! message. Diagnostics order by location, then kind, then message, so the
//! stream produced by a pass is deterministic.

use crate::location::SourceLocation;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Diagnostic kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The registration or its signature is incomplete or invalid.
    MalformedSignature,
    /// More than one parameter reads the request body.
    AtMostOneFromBodyAttribute,
    /// The binding source cannot be decided.
    AmbiguousBindingSource,
    /// A binder or parse member will never be selected.
    UnreachableBinder,
    /// An `as_parameters` aggregate cannot be expanded.
    InvalidAsParameters,
}

impl DiagnosticKind {
    /// Stable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MalformedSignature => "RG0001",
            Self::AtMostOneFromBodyAttribute => "RG0002",
            Self::AmbiguousBindingSource => "RG0003",
            Self::UnreachableBinder => "RG0004",
            Self::InvalidAsParameters => "RG0005",
        }
    }

    /// Severity used when a diagnostic of this kind is raised.
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::UnreachableBinder => Severity::Hint,
            Self::MalformedSignature
            | Self::AtMostOneFromBodyAttribute
            | Self::AmbiguousBindingSource
            | Self::InvalidAsParameters => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks emission of the endpoint's dispatch code.
    Error,
    /// Reported, emission continues.
    Warning,
    /// Informational.
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
        };
        f.write_str(name)
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Kind.
    pub kind: DiagnosticKind,
    /// Severity.
    pub severity: Severity,
    /// Where it applies.
    pub location: SourceLocation,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic with the kind's default severity.
    #[must_use]
    pub fn new(kind: DiagnosticKind, location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            location,
            message: message.into(),
        }
    }

    /// `MalformedSignature` at `location`.
    #[must_use]
    pub fn malformed(location: SourceLocation, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::MalformedSignature, location, message)
    }

    /// Returns `true` for error severity.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.location
            .cmp(&other.location)
            .then(self.kind.cmp(&other.kind))
            .then_with(|| self.message.cmp(&other.message))
            .then(self.severity.cmp(&other.severity))
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.location, self.severity, self.kind, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DiagnosticKind::MalformedSignature.code(), "RG0001");
        assert_eq!(DiagnosticKind::AtMostOneFromBodyAttribute.code(), "RG0002");
        assert_eq!(DiagnosticKind::AmbiguousBindingSource.code(), "RG0003");
        assert_eq!(DiagnosticKind::UnreachableBinder.code(), "RG0004");
        assert_eq!(DiagnosticKind::InvalidAsParameters.code(), "RG0005");
    }

    #[test]
    fn test_unreachable_binder_is_hint() {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::UnreachableBinder,
            SourceLocation::default(),
            "never selected",
        );
        assert_eq!(diagnostic.severity, Severity::Hint);
        assert!(!diagnostic.is_error());
        assert!(Diagnostic::malformed(SourceLocation::default(), "x").is_error());
    }

    #[test]
    fn test_ordering_location_then_kind() {
        let early = SourceLocation::new("a.rs", 1, 1);
        let late = SourceLocation::new("a.rs", 2, 1);
        let mut diagnostics = vec![
            Diagnostic::new(DiagnosticKind::MalformedSignature, late.clone(), "b"),
            Diagnostic::new(DiagnosticKind::AmbiguousBindingSource, early.clone(), "a"),
            Diagnostic::new(DiagnosticKind::AtMostOneFromBodyAttribute, early.clone(), "z"),
        ];
        diagnostics.sort();

        assert_eq!(diagnostics[0].kind, DiagnosticKind::AtMostOneFromBodyAttribute);
        assert_eq!(diagnostics[1].kind, DiagnosticKind::AmbiguousBindingSource);
        assert_eq!(diagnostics[2].location, late);
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::malformed(SourceLocation::new("h.rs", 4, 2), "empty route");
        assert_eq!(diagnostic.to_string(), "h.rs:4:2: error[RG0001]: empty route");
    }
}
