//! Read-only cross-module facade: maps any requirement back to its owning
//! module's candidate table.

use std::collections::HashMap;
use std::sync::Arc;

use modwire_core::capability::Capability;
use modwire_core::requirement::Requirement;
use modwire_core::resource::ResourceId;

use crate::resource::ResolverResource;

/// View over the per-resolve registry of `ResolverResource`s, keyed by
/// module identity.
///
/// Copying this handle is shallow: it never snapshots candidate state, so a
/// consumer can observe narrowing but can never roll it back. Mutation goes
/// through the orchestrator's registry, one module at a time, not through
/// this facade.
#[derive(Clone, Copy)]
pub struct Candidates<'a> {
    resources: &'a [ResolverResource],
    index: &'a HashMap<ResourceId, usize>,
}

impl<'a> Candidates<'a> {
    pub fn new(
        resources: &'a [ResolverResource],
        index: &'a HashMap<ResourceId, usize>,
    ) -> Self {
        Self { resources, index }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn resource(&self, id: &ResourceId) -> Option<&'a ResolverResource> {
        self.index.get(id).map(|&i| &self.resources[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a ResolverResource> {
        self.resources.iter()
    }

    /// First enabled candidate for a requirement, resolved through the
    /// owning module. Absent if the module is unknown.
    pub fn first_candidate(&self, requirement: &Requirement) -> Option<Arc<Capability>> {
        self.resource(&requirement.resource)?
            .first_candidate(requirement)
    }

    /// All enabled candidates for a requirement; empty if the module is
    /// unknown or nothing remains enabled.
    pub fn candidates(&self, requirement: &Requirement) -> Vec<Arc<Capability>> {
        self.resource(&requirement.resource)
            .map(|r| r.candidates(requirement))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modwire_core::context::StaticContext;
    use modwire_core::resource::Resource;

    fn rid(s: &str) -> ResourceId {
        ResourceId::parse(s).unwrap()
    }

    #[test]
    fn lookup_routes_through_owning_module() {
        let mut context = StaticContext::new();
        let mut lib = Resource::new(rid("lib:1.0.0"));
        lib.export_package("org.example.api", []);
        context.add_mandatory(lib);

        let mut app = Resource::new(rid("app:1.0.0"));
        app.import_package("org.example.api");
        let requirement = app.requirements[0].clone();

        let resources = vec![ResolverResource::new(&app, &context, true)];
        let index: HashMap<ResourceId, usize> =
            resources.iter().enumerate().map(|(i, r)| (r.id().clone(), i)).collect();
        let candidates = Candidates::new(&resources, &index);

        assert_eq!(candidates.len(), 1);
        let first = candidates.first_candidate(&requirement).unwrap();
        assert_eq!(first.provider, rid("lib:1.0.0"));
        assert_eq!(candidates.candidates(&requirement).len(), 1);
    }

    #[test]
    fn unknown_module_yields_nothing() {
        let resources: Vec<ResolverResource> = Vec::new();
        let index = HashMap::new();
        let candidates = Candidates::new(&resources, &index);
        let requirement =
            modwire_core::requirement::Requirement::package(rid("ghost:1.0.0"), "org.example.api");
        assert!(candidates.first_candidate(&requirement).is_none());
        assert!(candidates.candidates(&requirement).is_empty());
    }
}
