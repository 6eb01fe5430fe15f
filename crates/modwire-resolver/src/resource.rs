//! Per-module candidate table: one `Wires` entry per non-dynamic requirement.

use std::collections::BTreeSet;
use std::sync::Arc;

use modwire_core::capability::Capability;
use modwire_core::context::ResolveContext;
use modwire_core::requirement::Requirement;
use modwire_core::resource::{Resource, ResourceId};
use modwire_core::wire::Wire;

use crate::wires::Wires;

/// Snapshot of a singleton selection, taken before a propagation pass so the
/// pass can mutate other entries of the same table without aliasing it.
#[derive(Debug, Clone)]
pub struct SingletonWire {
    pub requirement: Arc<Requirement>,
    pub provider: ResourceId,
    pub package_name: Option<String>,
    pub uses: BTreeSet<String>,
}

/// A module's view of resolution: its requirement-to-candidates table.
///
/// The table is built once at construction by querying the context for every
/// non-dynamic requirement, in declaration order. Membership never changes
/// afterwards; only per-wire disabled flags do.
#[derive(Debug)]
pub struct ResolverResource {
    id: ResourceId,
    mandatory: bool,
    /// Module-level feasibility; cleared when a mandatory requirement ends
    /// with zero enabled candidates. An infeasible module emits no wires.
    resolvable: bool,
    /// The module's own package exports, for substitution detection and the
    /// global checker's view of what this module sees for a package.
    exports: Vec<Arc<Capability>>,
    table: Vec<Wires>,
}

impl ResolverResource {
    pub fn new(resource: &Resource, context: &dyn ResolveContext, mandatory: bool) -> Self {
        let exports: Vec<Arc<Capability>> = resource
            .capabilities
            .iter()
            .filter(|c| c.package_name().is_some())
            .cloned()
            .collect();

        let mut table = Vec::new();
        for requirement in &resource.requirements {
            if requirement.dynamic {
                continue;
            }
            let providers = context.find_providers(requirement);
            let substitution = requirement.namespace.is_package()
                && providers.iter().any(|c| {
                    c.package_name()
                        .is_some_and(|p| resource.exports_package(p))
                });
            table.push(Wires::new(requirement.clone(), providers, substitution));
        }

        Self {
            id: resource.id.clone(),
            mandatory,
            resolvable: true,
            exports,
            table,
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn is_resolvable(&self) -> bool {
        self.resolvable
    }

    pub fn mark_unresolvable(&mut self) {
        self.resolvable = false;
    }

    /// This module's own export of a package, if it has one.
    pub fn export(&self, package: &str) -> Option<&Arc<Capability>> {
        self.exports
            .iter()
            .find(|c| c.package_name() == Some(package))
    }

    pub fn table(&self) -> &[Wires] {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut [Wires] {
        &mut self.table
    }

    /// The candidate row importing the given package, if any.
    pub fn package_wires(&self, package: &str) -> Option<&Wires> {
        self.table.iter().find(|w| {
            let req = w.requirement();
            req.namespace.is_package() && req.name == package
        })
    }

    pub fn wires_for(&self, requirement: &Requirement) -> Option<&Wires> {
        self.table.iter().find(|w| **w.requirement() == *requirement)
    }

    pub fn wires_for_mut(&mut self, requirement: &Requirement) -> Option<&mut Wires> {
        self.table
            .iter_mut()
            .find(|w| **w.requirement() == *requirement)
    }

    /// The selected wiring: the first enabled wire of every requirement.
    ///
    /// Requirements with zero enabled wires contribute nothing; an
    /// infeasible module contributes nothing at all.
    pub fn wires(&self) -> Vec<Wire> {
        if !self.resolvable {
            return Vec::new();
        }
        self.table
            .iter()
            .filter_map(|wires| wires.first_enabled().map(|w| w.to_wire()))
            .collect()
    }

    /// Non-optional requirements that ended with zero enabled candidates.
    pub fn unresolved(&self) -> Vec<Arc<Requirement>> {
        self.table
            .iter()
            .filter(|wires| !wires.requirement().optional && wires.enabled_count() == 0)
            .map(|wires| wires.requirement().clone())
            .collect()
    }

    /// Snapshot of all current singleton selections (non-optional
    /// requirements reduced to exactly one enabled candidate).
    pub fn singletons(&self) -> Vec<SingletonWire> {
        self.table
            .iter()
            .filter(|wires| wires.is_singleton())
            .filter_map(|wires| {
                wires.singleton().map(|w| SingletonWire {
                    requirement: wires.requirement().clone(),
                    provider: w.provider().clone(),
                    package_name: w.package_name().map(str::to_owned),
                    uses: w.uses().clone(),
                })
            })
            .collect()
    }

    /// Requirements with exactly one enabled candidate. Diagnostics only.
    pub fn count_unique_selected(&self) -> usize {
        self.table
            .iter()
            .filter(|wires| wires.enabled_count() == 1)
            .count()
    }

    /// Total candidate count at construction time; the propagation bound
    /// derives from it.
    pub fn initial_candidate_count(&self) -> usize {
        self.table.iter().map(Wires::len).sum()
    }

    /// Cross-module query surface: the first enabled candidate capability.
    pub fn first_candidate(&self, requirement: &Requirement) -> Option<Arc<Capability>> {
        self.wires_for(requirement)?
            .first_enabled()
            .map(|w| w.capability().clone())
    }

    /// Cross-module query surface: all enabled candidate capabilities.
    pub fn candidates(&self, requirement: &Requirement) -> Vec<Arc<Capability>> {
        self.wires_for(requirement)
            .map(|wires| wires.enabled().map(|w| w.capability().clone()).collect())
            .unwrap_or_default()
    }
}
