//! Diagnostic collection.
//!
//! Looks at the resolution outcome of every parameter of one endpoint and
//! raises the endpoint's diagnostics:
//!
//! - `AmbiguousBindingSource` / `InvalidAsParameters` where resolution failed,
//! - `AtMostOneFromBodyAttribute` where more than one parameter reads the body,
//! - `UnreachableBinder` hints for members capability discovery found but
//!   resolution can never select.

use crate::resolver::ResolutionFailure;
use routegen_core::{
    BindingSource, Diagnostic, DiagnosticKind, FieldExpansion, MemberCandidate, MemberKind,
    ParameterDescriptor, SourceLocation, TypeCapabilities, TypeRef,
};
use std::collections::HashSet;

/// A parameter together with its resolution outcome.
pub type Outcome = (ParameterDescriptor, Result<BindingSource, ResolutionFailure>);

/// Collects the diagnostics of one endpoint, sorted.
pub fn collect(outcomes: &[Outcome]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    failures(outcomes, &mut diagnostics);
    body_conflicts(outcomes, &mut diagnostics);
    unreachable_binders(outcomes, &mut diagnostics);
    diagnostics.sort();
    diagnostics
}

fn failures(outcomes: &[Outcome], out: &mut Vec<Diagnostic>) {
    for (descriptor, result) in outcomes {
        let Err(failure) = result else {
            continue;
        };
        let kind = match failure {
            ResolutionFailure::Ambiguous { .. } | ResolutionFailure::ConflictingAttributes { .. } => {
                DiagnosticKind::AmbiguousBindingSource
            }
            ResolutionFailure::InvalidAsParameters { .. } => DiagnosticKind::InvalidAsParameters,
        };
        out.push(Diagnostic::new(
            kind,
            descriptor.location.clone(),
            format!("cannot bind parameter `{}`: {failure}", descriptor.name),
        ));
    }
}

struct BodyReader<'a> {
    name: &'a str,
    location: &'a SourceLocation,
    explicit: bool,
    duplicate_attribute: bool,
}

/// A signature may read the body at most once.
///
/// When two or more parameters (or `as_parameters` fields) are bound from
/// the body, every one carrying an explicit body attribute is flagged, and
/// every inferred one after the first reader is flagged. A parameter with
/// two body attributes is flagged on its own.
fn body_conflicts(outcomes: &[Outcome], out: &mut Vec<Diagnostic>) {
    let mut readers = Vec::new();
    for (descriptor, result) in outcomes {
        match result {
            Ok(BindingSource::AsParameters { fields }) => {
                let FieldExpansion::Expanded(descriptors) = &descriptor.fields else {
                    continue;
                };
                for (field, field_descriptor) in fields.iter().zip(descriptors) {
                    if field.source.is_body() {
                        readers.push(reader(field_descriptor, &field.source));
                    }
                }
            }
            Ok(source) if source.is_body() => readers.push(reader(descriptor, source)),
            _ => {}
        }
    }

    let conflict = readers.len() > 1;
    for (position, reader) in readers.iter().enumerate() {
        let message = if reader.duplicate_attribute {
            format!(
                "parameter `{}` has more than one `from_body` attribute",
                reader.name
            )
        } else if conflict && (reader.explicit || position > 0) {
            format!(
                "parameter `{}` reads the request body, but at most one parameter may be bound from the body",
                reader.name
            )
        } else {
            continue;
        };
        out.push(Diagnostic::new(
            DiagnosticKind::AtMostOneFromBodyAttribute,
            reader.location.clone(),
            message,
        ));
    }
}

fn reader<'a>(descriptor: &'a ParameterDescriptor, source: &BindingSource) -> BodyReader<'a> {
    BodyReader {
        name: &descriptor.name,
        location: &descriptor.location,
        explicit: matches!(source, BindingSource::ExplicitBody { .. }),
        duplicate_attribute: descriptor.body_attribute_count() > 1,
    }
}

const BINDERS: [MemberKind; 2] = [MemberKind::BindWithParameter, MemberKind::Bind];
const PARSERS: [MemberKind; 2] = [MemberKind::TryParseWithFormat, MemberKind::TryParse];

/// Hints for binder and parse members that can never be selected, raised
/// once per type at the first parameter of that type.
fn unreachable_binders(outcomes: &[Outcome], out: &mut Vec<Diagnostic>) {
    let mut parameters: Vec<(&ParameterDescriptor, Option<&BindingSource>)> = Vec::new();
    for (descriptor, result) in outcomes {
        parameters.push((descriptor, result.as_ref().ok()));
        if let FieldExpansion::Expanded(fields) = &descriptor.fields {
            let bound: Vec<Option<&BindingSource>> = match result {
                Ok(BindingSource::AsParameters { fields }) => {
                    fields.iter().map(|f| Some(&f.source)).collect()
                }
                _ => vec![None; fields.len()],
            };
            parameters.extend(fields.iter().zip(bound));
        }
    }

    let mut seen: HashSet<&TypeRef> = HashSet::new();
    for (descriptor, _) in &parameters {
        let caps = &descriptor.capabilities;
        if !seen.insert(&caps.ty) {
            continue;
        }
        let parsed = parameters.iter().any(|(other, source)| {
            other.capabilities.ty == caps.ty && source.is_some_and(|s| reaches_parser(other, s))
        });
        for (candidate, reason) in dominated(caps, parsed) {
            out.push(Diagnostic::new(
                DiagnosticKind::UnreachableBinder,
                descriptor.location.clone(),
                format!(
                    "`{}` declared by `{}` is never selected for `{}`: {reason}",
                    candidate.kind.method_name(),
                    candidate.declaring_type,
                    caps.ty
                ),
            ));
        }
        for candidate in caps
            .mismatched
            .iter()
            .filter(|c| BINDERS.contains(&c.kind) || PARSERS.contains(&c.kind))
        {
            out.push(Diagnostic::new(
                DiagnosticKind::UnreachableBinder,
                descriptor.location.clone(),
                format!(
                    "`{}` declared by `{}` produces `{}`, not `{}`",
                    candidate.kind.method_name(),
                    candidate.declaring_type,
                    candidate.bound_type,
                    caps.ty
                ),
            ));
        }
    }
}

/// Whether a parameter bound by `source` uses its type's parse member even
/// when the type also has a binder: explicit keyed attributes and sequences
/// skip the binder rules.
fn reaches_parser(descriptor: &ParameterDescriptor, source: &BindingSource) -> bool {
    descriptor.shape.sequence
        || matches!(
            source,
            BindingSource::ExplicitRoute { .. }
                | BindingSource::ExplicitQuery { .. }
                | BindingSource::ExplicitHeader { .. }
                | BindingSource::ExplicitForm { .. }
        )
}

/// Candidates bound to the type that lose to another candidate.
///
/// `parsed` is set when some parameter of the type reaches its parse
/// member directly, which keeps the best parse member reachable even if a
/// binder exists.
fn dominated(caps: &TypeCapabilities, parsed: bool) -> Vec<(&MemberCandidate, String)> {
    let winning_binder = BINDERS.into_iter().find(|kind| caps.has(*kind));
    let winning_parser = PARSERS.into_iter().find(|kind| caps.has(*kind));

    let mut lost = Vec::new();
    for candidate in &caps.candidates {
        let shallowest = caps
            .of_kind(candidate.kind)
            .next()
            .map_or(candidate.depth, |c| c.depth);
        if candidate.depth > shallowest
            && (BINDERS.contains(&candidate.kind) || PARSERS.contains(&candidate.kind))
        {
            lost.push((
                candidate,
                "a more derived declaration takes precedence".to_string(),
            ));
            continue;
        }

        let winner = if BINDERS.contains(&candidate.kind) {
            winning_binder
        } else if PARSERS.contains(&candidate.kind) {
            match winning_binder {
                Some(binder) if !parsed => Some(binder),
                _ => winning_parser,
            }
        } else {
            None
        };
        if let Some(winner) = winner.filter(|w| *w != candidate.kind) {
            lost.push((candidate, format!("`{}` takes precedence", winner.method_name())));
        }
    }
    lost
}
