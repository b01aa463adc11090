//! Capabilities discovered from a type.

use crate::catalog::MemberKind;
use crate::types::TypeRef;
use serde::{Deserialize, Serialize};

/// One member that can bind or parse a type, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberCandidate {
    /// What the member does.
    pub kind: MemberKind,
    /// Type (record or interface) that declares it.
    pub declaring_type: TypeRef,
    /// 0 on the type itself, +1 per base level, interfaces one above their lister.
    pub depth: u32,
    /// Type the member produces.
    pub bound_type: TypeRef,
}

/// The capability flags of a parameter type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityFlags {
    /// Has `try_parse(value)`.
    pub has_parse: bool,
    /// Has `try_parse_with_format(value, format)`.
    pub has_parse_with_format: bool,
    /// Has `bind_with_parameter(ctx, parameter)`.
    pub has_binder_with_parameter: bool,
    /// Has `bind(ctx)`.
    pub has_binder_context_only: bool,
    /// Lists one of the binder traits.
    pub implements_binder_interface: bool,
    /// An aggregate that is not string convertible.
    pub is_complex: bool,
    /// A primitive or a type with a string conversion.
    pub is_simple: bool,
}

/// Everything capability discovery learned about one type.
///
/// Computed once per distinct type and shared between all parameters that
/// mention it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCapabilities {
    /// The type described.
    pub ty: TypeRef,
    /// Members whose bound type is `ty`, sorted by kind, depth and declaring type.
    pub candidates: Vec<MemberCandidate>,
    /// Members reachable from `ty` whose bound type is something else.
    pub mismatched: Vec<MemberCandidate>,
    /// Primitive, standard string-convertible, or `FromStr`.
    pub simple: bool,
    /// Lists a binder trait directly or through a base.
    pub binder_interface: bool,
    /// Implements the result capability trait.
    pub result_capability: bool,
    /// The type has a catalog entry.
    pub declared: bool,
}

impl TypeCapabilities {
    /// Capabilities of a type the catalog does not know.
    #[must_use]
    pub fn unknown(ty: TypeRef) -> Self {
        Self {
            ty,
            candidates: Vec::new(),
            mismatched: Vec::new(),
            simple: false,
            binder_interface: false,
            result_capability: false,
            declared: false,
        }
    }

    /// Candidates of one kind, shallowest first.
    pub fn of_kind(&self, kind: MemberKind) -> impl Iterator<Item = &MemberCandidate> {
        self.candidates.iter().filter(move |c| c.kind == kind)
    }

    /// Returns `true` if at least one candidate of `kind` exists.
    #[must_use]
    pub fn has(&self, kind: MemberKind) -> bool {
        self.of_kind(kind).next().is_some()
    }

    /// Summarises the capabilities as flags.
    #[must_use]
    pub fn flags(&self) -> CapabilityFlags {
        let simple = self.simple || self.has(MemberKind::FromStr);
        CapabilityFlags {
            has_parse: self.has(MemberKind::TryParse),
            has_parse_with_format: self.has(MemberKind::TryParseWithFormat),
            has_binder_with_parameter: self.has(MemberKind::BindWithParameter),
            has_binder_context_only: self.has(MemberKind::Bind),
            implements_binder_interface: self.binder_interface,
            is_complex: !simple,
            is_simple: simple,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    fn candidate(kind: MemberKind, depth: u32) -> MemberCandidate {
        MemberCandidate {
            kind,
            declaring_type: ty("Todo"),
            depth,
            bound_type: ty("Todo"),
        }
    }

    #[test]
    fn test_unknown_type_is_complex() {
        let caps = TypeCapabilities::unknown(ty("Product"));
        let flags = caps.flags();
        assert!(flags.is_complex);
        assert!(!flags.is_simple);
        assert!(!flags.has_parse);
    }

    #[test]
    fn test_flags_from_candidates() {
        let mut caps = TypeCapabilities::unknown(ty("Todo"));
        caps.candidates = vec![
            candidate(MemberKind::BindWithParameter, 0),
            candidate(MemberKind::TryParse, 1),
            candidate(MemberKind::FromStr, 0),
        ];

        let flags = caps.flags();
        assert!(flags.has_binder_with_parameter);
        assert!(!flags.has_binder_context_only);
        assert!(flags.has_parse);
        assert!(!flags.has_parse_with_format);
        assert!(flags.is_simple);
        assert_eq!(caps.of_kind(MemberKind::TryParse).count(), 1);
    }
}
