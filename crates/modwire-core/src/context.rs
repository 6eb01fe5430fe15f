use std::collections::HashMap;
use std::sync::Arc;

use crate::capability::Capability;
use crate::requirement::Requirement;
use crate::resource::{Resource, ResourceId};
use crate::wire::Wire;

/// The collaborator a resolve invocation consumes.
///
/// Supplies the resources to resolve and the matching engine. The order of
/// `mandatory_resources` and `optional_resources` is priority order, and the
/// order of `find_providers` results is the resolver's tie-break: the first
/// enabled candidate wins. Implementations must be `Sync` because candidate
/// discovery is dispatched to a worker pool.
pub trait ResolveContext: Sync {
    /// Resources that must resolve, highest priority first.
    fn mandatory_resources(&self) -> &[Resource];

    /// Resources the resolver may additionally resolve, highest priority first.
    fn optional_resources(&self) -> &[Resource];

    /// Ordered candidate capabilities matching a requirement.
    ///
    /// Namespace and attribute filter evaluation lives here, outside the
    /// resolver core.
    fn find_providers(&self, requirement: &Requirement) -> Vec<Arc<Capability>>;

    /// Wirings of already-resolved modules; consulted for diagnostics only.
    fn wirings(&self) -> &HashMap<ResourceId, Vec<Wire>>;
}

/// In-memory `ResolveContext` over a fixed resource set.
///
/// Matches candidates by namespace and exact name, in capability
/// registration order (mandatory resources before optional ones, and within
/// a resource in declaration order), which makes resolution over it fully
/// deterministic.
#[derive(Debug, Default)]
pub struct StaticContext {
    mandatory: Vec<Resource>,
    optional: Vec<Resource>,
    wirings: HashMap<ResourceId, Vec<Wire>>,
}

impl StaticContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mandatory(&mut self, resource: Resource) -> &mut Self {
        self.mandatory.push(resource);
        self
    }

    pub fn add_optional(&mut self, resource: Resource) -> &mut Self {
        self.optional.push(resource);
        self
    }

    /// Record an already-resolved module's wiring.
    pub fn add_wiring(&mut self, resource: ResourceId, wires: Vec<Wire>) -> &mut Self {
        self.wirings.insert(resource, wires);
        self
    }
}

impl ResolveContext for StaticContext {
    fn mandatory_resources(&self) -> &[Resource] {
        &self.mandatory
    }

    fn optional_resources(&self) -> &[Resource] {
        &self.optional
    }

    fn find_providers(&self, requirement: &Requirement) -> Vec<Arc<Capability>> {
        self.mandatory
            .iter()
            .chain(self.optional.iter())
            .flat_map(|r| r.capabilities.iter())
            .filter(|c| {
                c.namespace == requirement.namespace && c.name() == Some(requirement.name.as_str())
            })
            .cloned()
            .collect()
    }

    fn wirings(&self) -> &HashMap<ResourceId, Vec<Wire>> {
        &self.wirings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str) -> Resource {
        Resource::new(ResourceId::parse(&format!("{name}:1.0.0")).unwrap())
    }

    #[test]
    fn find_providers_preserves_registration_order() {
        let mut first = resource("first");
        first.export_package("org.example.api", []);
        let mut second = resource("second");
        second.export_package("org.example.api", []);

        let mut context = StaticContext::new();
        context.add_mandatory(first).add_mandatory(second);

        let req = Requirement::package(ResourceId::parse("app:1.0.0").unwrap(), "org.example.api");
        let providers = context.find_providers(&req);
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].provider.symbolic_name, "first");
        assert_eq!(providers[1].provider.symbolic_name, "second");
    }

    #[test]
    fn find_providers_filters_namespace() {
        let mut lib = resource("lib");
        lib.provide(crate::namespace::Namespace::Bundle, "org.example.api");
        let mut context = StaticContext::new();
        context.add_mandatory(lib);

        let req = Requirement::package(ResourceId::parse("app:1.0.0").unwrap(), "org.example.api");
        assert!(context.find_providers(&req).is_empty());
    }

    #[test]
    fn optional_resources_rank_after_mandatory() {
        let mut optional = resource("optional");
        optional.export_package("org.example.api", []);
        let mut mandatory = resource("mandatory");
        mandatory.export_package("org.example.api", []);

        let mut context = StaticContext::new();
        context.add_optional(optional);
        context.add_mandatory(mandatory);

        let req = Requirement::package(ResourceId::parse("app:1.0.0").unwrap(), "org.example.api");
        let providers = context.find_providers(&req);
        assert_eq!(providers[0].provider.symbolic_name, "mandatory");
    }
}
