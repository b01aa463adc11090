//! Capability discovery.
//!
//! Walks a type's catalog entry, its base chain and the interfaces listed
//! along the way, collecting every binder and parse member together with the
//! depth it was found at. Results are memoised per type in a concurrent map
//! so parallel resolution of many endpoints computes each type once.

use dashmap::DashMap;
use routegen_core::{
    well_known, BindTarget, GenericRef, MemberCandidate, MemberKind, TypeCapabilities,
    TypeCatalog, TypeDecl, TypeRef,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Memoised capability discovery over one catalog snapshot.
#[derive(Debug)]
pub struct CapabilityCache<'a> {
    catalog: &'a TypeCatalog,
    memo: DashMap<TypeRef, Arc<TypeCapabilities>>,
}

impl<'a> CapabilityCache<'a> {
    /// Creates an empty cache over `catalog`.
    #[must_use]
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self {
            catalog,
            memo: DashMap::new(),
        }
    }

    /// The catalog this cache reads.
    #[must_use]
    pub fn catalog(&self) -> &'a TypeCatalog {
        self.catalog
    }

    /// Returns the capabilities of `ty`, computing them on first use.
    pub fn get(&self, ty: &TypeRef) -> Arc<TypeCapabilities> {
        if let Some(found) = self.memo.get(ty) {
            return Arc::clone(found.value());
        }
        let computed = Arc::new(discover(self.catalog, ty));
        // Another thread may have raced us; keep whichever landed first.
        Arc::clone(
            self.memo
                .entry(ty.clone())
                .or_insert_with(|| computed)
                .value(),
        )
    }

    /// Number of distinct types discovered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    /// Returns `true` if nothing has been discovered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}

struct Walk<'c> {
    catalog: &'c TypeCatalog,
    found: Vec<MemberCandidate>,
    binder_interface: bool,
    result_capability: bool,
    visited_interfaces: HashSet<(TypeRef, TypeRef)>,
}

fn discover(catalog: &TypeCatalog, ty: &TypeRef) -> TypeCapabilities {
    let Some(decl) = catalog.get(ty) else {
        let mut caps = TypeCapabilities::unknown(ty.clone());
        caps.simple = well_known::is_builtin_simple(ty);
        return caps;
    };

    let mut walk = Walk {
        catalog,
        found: Vec::new(),
        binder_interface: false,
        result_capability: false,
        visited_interfaces: HashSet::new(),
    };

    let mut visited_bases = HashSet::new();
    let mut level: Option<(&TypeDecl, Vec<TypeRef>)> = Some((decl, Vec::new()));
    let mut depth = 0;
    while let Some((current, args)) = level.take() {
        if !visited_bases.insert(current.name.clone()) {
            break;
        }
        walk.record_level(current, &args, depth);
        level = current
            .base
            .as_ref()
            .and_then(|base| catalog.get(&base.name).map(|d| (d, base.args.clone())));
        depth += 1;
    }

    let (mut candidates, mut mismatched): (Vec<_>, Vec<_>) =
        walk.found.into_iter().partition(|c| &c.bound_type == ty);
    candidates = shallowest_per_declarer(candidates);
    mismatched = shallowest_per_declarer(mismatched);

    let simple = well_known::is_builtin_simple(ty)
        || candidates.iter().any(|c| c.kind == MemberKind::FromStr);

    TypeCapabilities {
        ty: ty.clone(),
        candidates,
        mismatched,
        simple,
        binder_interface: walk.binder_interface,
        result_capability: walk.result_capability,
        declared: true,
    }
}

impl Walk<'_> {
    /// Records the members of one level of the base chain and the
    /// interfaces it lists.
    fn record_level(&mut self, decl: &TypeDecl, args: &[TypeRef], depth: u32) {
        for member in &decl.members {
            let bound = bound_type(&member.binds, &decl.name, args);
            self.push(member.kind, &decl.name, depth, bound);
        }
        for interface in &decl.interfaces {
            self.record_interface(interface, &decl.name, depth);
        }
    }

    fn record_interface(&mut self, interface: &GenericRef, lister: &TypeRef, lister_depth: u32) {
        if !self
            .visited_interfaces
            .insert((interface.name.clone(), lister.clone()))
        {
            return;
        }
        if well_known::is_binder_interface(&interface.name) {
            self.binder_interface = true;
        }
        if well_known::is_result_capability(&interface.name) {
            self.result_capability = true;
        }

        // Runtime traits are implemented by the lister itself.
        if let Some(kind) = well_known::implied_member(&interface.name) {
            let bound = interface.args.first().cloned().unwrap_or_else(|| lister.clone());
            self.push(kind, lister, lister_depth, bound);
        }

        let Some(decl) = self.catalog.get(&interface.name) else {
            return;
        };
        let depth = lister_depth + 1;
        for member in &decl.members {
            if matches!(member.kind, MemberKind::Bind | MemberKind::BindWithParameter) {
                self.binder_interface = true;
            }
            let bound = match &member.binds {
                BindTarget::SelfType => lister.clone(),
                other => bound_type(other, &decl.name, &interface.args),
            };
            self.push(member.kind, &decl.name, depth, bound);
        }
        for inherited in &decl.interfaces {
            self.record_interface(inherited, lister, depth);
        }
    }

    fn push(&mut self, kind: MemberKind, declaring: &TypeRef, depth: u32, bound: TypeRef) {
        self.found.push(MemberCandidate {
            kind,
            declaring_type: declaring.clone(),
            depth,
            bound_type: bound,
        });
    }
}

fn bound_type(target: &BindTarget, declaring: &TypeRef, args: &[TypeRef]) -> TypeRef {
    match target {
        BindTarget::SelfType => declaring.clone(),
        BindTarget::Concrete(ty) => ty.clone(),
        BindTarget::TypeArg(index) => args.get(*index).cloned().unwrap_or_else(|| declaring.clone()),
    }
}

/// Keeps one candidate per (kind, declaring type), the shallowest, and sorts
/// by kind, depth and declaring type.
fn shallowest_per_declarer(mut found: Vec<MemberCandidate>) -> Vec<MemberCandidate> {
    found.sort_by(|a, b| {
        (a.kind, a.depth, &a.declaring_type, &a.bound_type)
            .cmp(&(b.kind, b.depth, &b.declaring_type, &b.bound_type))
    });
    let mut seen = HashSet::new();
    found.retain(|c| seen.insert((c.kind, c.declaring_type.clone(), c.bound_type.clone())));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use routegen_core::MemberDecl;

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    fn catalog(decls: Vec<TypeDecl>) -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        for decl in decls {
            catalog.insert(decl).unwrap();
        }
        catalog
    }

    #[test]
    fn test_unknown_builtin_is_simple() {
        let catalog = TypeCatalog::new();
        let cache = CapabilityCache::new(&catalog);

        assert!(cache.get(&ty("i32")).flags().is_simple);
        assert!(cache.get(&ty("Product")).flags().is_complex);
        assert!(!cache.get(&ty("Product")).declared);
    }

    #[test]
    fn test_own_members_depth_zero() {
        let catalog = catalog(vec![TypeDecl::record(ty("Todo"))
            .with_member(MemberDecl::new(MemberKind::TryParse))
            .with_member(MemberDecl::new(MemberKind::TryParseWithFormat))]);
        let cache = CapabilityCache::new(&catalog);

        let caps = cache.get(&ty("Todo"));
        assert_eq!(caps.candidates.len(), 2);
        assert!(caps.candidates.iter().all(|c| c.depth == 0));
        assert!(caps.flags().has_parse);
        assert!(caps.flags().has_parse_with_format);
    }

    #[test]
    fn test_base_members_bound_through_type_argument() {
        let catalog = catalog(vec![
            TypeDecl::record(ty("BaseBinder"))
                .with_member(MemberDecl::new(MemberKind::Bind).binding(BindTarget::TypeArg(0))),
            TypeDecl::record(ty("Derived"))
                .with_base(GenericRef::with_args(ty("BaseBinder"), vec![ty("Derived")])),
        ]);
        let cache = CapabilityCache::new(&catalog);

        let caps = cache.get(&ty("Derived"));
        let bind: Vec<_> = caps.of_kind(MemberKind::Bind).collect();
        assert_eq!(bind.len(), 1);
        assert_eq!(bind[0].depth, 1);
        assert_eq!(bind[0].declaring_type, ty("BaseBinder"));
    }

    #[test]
    fn test_base_member_bound_to_base_is_mismatched() {
        let catalog = catalog(vec![
            TypeDecl::record(ty("Animal")).with_member(MemberDecl::new(MemberKind::TryParse)),
            TypeDecl::record(ty("Dog")).with_base(GenericRef::plain(ty("Animal"))),
        ]);
        let cache = CapabilityCache::new(&catalog);

        let caps = cache.get(&ty("Dog"));
        assert!(caps.candidates.is_empty());
        assert_eq!(caps.mismatched.len(), 1);
        assert_eq!(caps.mismatched[0].bound_type, ty("Animal"));
    }

    #[test]
    fn test_concrete_wrong_type_is_mismatched() {
        let catalog = catalog(vec![TypeDecl::record(ty("BindWrongType")).with_member(
            MemberDecl::new(MemberKind::BindWithParameter).binding(BindTarget::Concrete(ty("Todo"))),
        )]);
        let cache = CapabilityCache::new(&catalog);

        let caps = cache.get(&ty("BindWrongType"));
        assert!(!caps.flags().has_binder_with_parameter);
        assert_eq!(caps.mismatched.len(), 1);
    }

    #[test]
    fn test_interface_default_member_one_level_up() {
        let catalog = catalog(vec![
            TypeDecl::interface(ty("IBind"))
                .with_member(MemberDecl::new(MemberKind::BindWithParameter).binding(BindTarget::TypeArg(0))),
            TypeDecl::record(ty("Widget"))
                .with_interface(GenericRef::with_args(ty("IBind"), vec![ty("Widget")])),
        ]);
        let cache = CapabilityCache::new(&catalog);

        let caps = cache.get(&ty("Widget"));
        let found: Vec<_> = caps.of_kind(MemberKind::BindWithParameter).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].depth, 1);
        assert_eq!(found[0].declaring_type, ty("IBind"));
        assert!(caps.binder_interface);
    }

    #[test]
    fn test_runtime_trait_implies_member_on_lister() {
        let catalog = catalog(vec![TypeDecl::record(ty("Session"))
            .with_interface(GenericRef::plain(ty("routegen_runtime::BindFromContext")))]);
        let cache = CapabilityCache::new(&catalog);

        let caps = cache.get(&ty("Session"));
        let found: Vec<_> = caps.of_kind(MemberKind::Bind).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].depth, 0);
        assert_eq!(found[0].declaring_type, ty("Session"));
        assert!(caps.flags().implements_binder_interface);
    }

    #[test]
    fn test_from_str_makes_simple() {
        let catalog = catalog(vec![TypeDecl::record(ty("Status"))
            .with_interface(GenericRef::plain(ty("std::str::FromStr")))]);
        let cache = CapabilityCache::new(&catalog);

        assert!(cache.get(&ty("Status")).flags().is_simple);
    }

    #[test]
    fn test_result_capability_interface() {
        let catalog = catalog(vec![TypeDecl::record(ty("Created"))
            .with_interface(GenericRef::plain(ty("IntoDispatchResult")))]);
        let cache = CapabilityCache::new(&catalog);

        assert!(cache.get(&ty("Created")).result_capability);
    }

    #[test]
    fn test_base_cycle_terminates() {
        let catalog = catalog(vec![
            TypeDecl::record(ty("A")).with_base(GenericRef::plain(ty("B"))),
            TypeDecl::record(ty("B"))
                .with_base(GenericRef::plain(ty("A")))
                .with_member(MemberDecl::new(MemberKind::TryParse).binding(BindTarget::Concrete(ty("A")))),
        ]);
        let cache = CapabilityCache::new(&catalog);

        let caps = cache.get(&ty("A"));
        assert_eq!(caps.of_kind(MemberKind::TryParse).count(), 1);
    }

    #[test]
    fn test_memoised() {
        let catalog = catalog(vec![TypeDecl::record(ty("Todo"))]);
        let cache = CapabilityCache::new(&catalog);

        let first = cache.get(&ty("Todo"));
        let second = cache.get(&ty("Todo"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
