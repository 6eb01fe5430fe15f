//! Cross-module package-space consistency: detects modules exposed to two
//! different providers of the same package through different import paths.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use modwire_core::capability::Capability;
use modwire_core::context::ResolveContext;
use modwire_core::requirement::Requirement;
use modwire_core::resource::ResourceId;
use serde::Serialize;

use crate::candidates::Candidates;
use crate::resource::ResolverResource;

/// Attribution of one side of a use-constraint violation: the capability a
/// module is exposed to, and the requirement(s) that pinned it there.
#[derive(Debug, Clone, Serialize)]
pub struct Blame {
    pub capability: Arc<Capability>,
    pub requirements: Vec<Arc<Requirement>>,
}

impl fmt::Display for Blame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.capability)?;
        for req in &self.requirements {
            write!(f, " via {req}")?;
        }
        Ok(())
    }
}

/// A module sees two different providers of the same package.
///
/// `our_blame` is the view arriving through a uses chain (pinned by another
/// module's selection, when traceable); `other_blame` is the conflicting
/// view, usually the module's own direct import. `other_blame` is absent
/// when the conflicting side cannot be traced to a requirement.
#[derive(Debug, Clone, Serialize)]
pub struct UseConstraintError {
    /// The module where the inconsistency was observed.
    pub resource: ResourceId,
    pub package: String,
    pub our_blame: Blame,
    pub other_blame: Option<Blame>,
}

impl fmt::Display for UseConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "module {} is exposed to package '{}' from {}",
            self.resource, self.package, self.our_blame
        )?;
        if let Some(other) = &self.other_blame {
            write!(f, " and from {other}")?;
        }
        Ok(())
    }
}

/// The global-check seam of the pipeline. The provided implementation is
/// [`PackageSpaces`]; embedders with richer matching semantics can supply
/// their own.
pub trait ConsistencyCheck {
    fn check(
        &self,
        candidates: Candidates<'_>,
        context: &dyn ResolveContext,
    ) -> Vec<UseConstraintError>;
}

/// Default checker: computes every module's package space (the provider it
/// sees for each package, directly or through the uses closure of what it
/// imports) and reports each package visible from two providers.
///
/// Substitution rows and packages the module itself exports are exempt.
#[derive(Debug, Default)]
pub struct PackageSpaces;

/// How a package became visible: the capability and the requirement that
/// pinned the selection (none when pinned by a module's own export).
struct SpaceEntry {
    capability: Arc<Capability>,
    pinned: Vec<Arc<Requirement>>,
}

impl ConsistencyCheck for PackageSpaces {
    fn check(
        &self,
        candidates: Candidates<'_>,
        _context: &dyn ResolveContext,
    ) -> Vec<UseConstraintError> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for resource in candidates.iter() {
            check_resource(resource, candidates, &mut errors, &mut seen);
        }
        errors
    }
}

type SeenKey = (ResourceId, String, ResourceId, ResourceId);

fn check_resource(
    resource: &ResolverResource,
    candidates: Candidates<'_>,
    errors: &mut Vec<UseConstraintError>,
    seen: &mut HashSet<SeenKey>,
) {
    let mut space: BTreeMap<String, SpaceEntry> = BTreeMap::new();
    let mut worklist: VecDeque<(Arc<Capability>, Arc<Requirement>)> = VecDeque::new();
    let mut visited: HashSet<(String, ResourceId)> = HashSet::new();

    // Seed with the module's direct package imports.
    for wires in resource.table() {
        let requirement = wires.requirement();
        if !requirement.namespace.is_package() || wires.is_substitution() {
            continue;
        }
        let Some(wire) = wires.first_enabled() else {
            continue;
        };
        let capability = wire.capability().clone();
        visited.insert((requirement.name.clone(), capability.provider.clone()));
        worklist.push_back((capability.clone(), requirement.clone()));
        space.insert(
            requirement.name.clone(),
            SpaceEntry {
                capability,
                pinned: vec![requirement.clone()],
            },
        );
    }

    // Expand the uses closure through each capability's provider.
    while let Some((capability, root)) = worklist.pop_front() {
        for used in &capability.uses {
            if resource.export(used).is_some() {
                continue;
            }
            if resource
                .package_wires(used)
                .is_some_and(|w| w.is_substitution())
            {
                continue;
            }
            let Some(provider) = candidates.resource(&capability.provider) else {
                // Provider is outside this resolve; nothing to cross-check.
                continue;
            };
            let Some((used_cap, pin)) = provider_view(provider, used) else {
                continue;
            };
            match space.get(used) {
                Some(existing) if existing.capability.provider != used_cap.provider => {
                    let key = (
                        resource.id().clone(),
                        used.clone(),
                        used_cap.provider.clone(),
                        existing.capability.provider.clone(),
                    );
                    if seen.insert(key) {
                        errors.push(UseConstraintError {
                            resource: resource.id().clone(),
                            package: used.clone(),
                            our_blame: Blame {
                                capability: used_cap.clone(),
                                requirements: vec![pin.unwrap_or_else(|| root.clone())],
                            },
                            other_blame: Some(Blame {
                                capability: existing.capability.clone(),
                                requirements: existing.pinned.clone(),
                            }),
                        });
                    }
                }
                Some(_) => {}
                None => {
                    if visited.insert((used.clone(), used_cap.provider.clone())) {
                        worklist.push_back((used_cap.clone(), root.clone()));
                    }
                    space.insert(
                        used.clone(),
                        SpaceEntry {
                            capability: used_cap,
                            pinned: vec![pin.unwrap_or_else(|| root.clone())],
                        },
                    );
                }
            }
        }
    }
}

/// What a providing module sees for a package: its own export, or its
/// currently selected import together with the pinning requirement.
fn provider_view(
    provider: &ResolverResource,
    package: &str,
) -> Option<(Arc<Capability>, Option<Arc<Requirement>>)> {
    if let Some(own) = provider.export(package) {
        return Some((own.clone(), None));
    }
    let wires = provider.package_wires(package)?;
    let wire = wires.first_enabled()?;
    Some((wire.capability().clone(), Some(wires.requirement().clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use modwire_core::context::StaticContext;
    use modwire_core::resource::Resource;

    fn rid(s: &str) -> ResourceId {
        ResourceId::parse(s).unwrap()
    }

    /// Registry fixture: y and x both export pkg.u; a imports it and exports
    /// pkg.q whose API uses pkg.u; b imports both pkg.u and pkg.q.
    fn fixture() -> (StaticContext, Vec<Resource>) {
        let mut y = Resource::new(rid("y:1.0.0"));
        y.export_package("pkg.u", []);
        let mut x = Resource::new(rid("x:1.0.0"));
        x.export_package("pkg.u", []);
        let mut a = Resource::new(rid("a:1.0.0"));
        a.export_package("pkg.q", ["pkg.u"]);
        a.import_package("pkg.u");
        let mut b = Resource::new(rid("b:1.0.0"));
        b.import_package("pkg.u");
        b.import_package("pkg.q");

        let mut context = StaticContext::new();
        context
            .add_mandatory(y.clone())
            .add_mandatory(x.clone())
            .add_mandatory(a.clone())
            .add_mandatory(b.clone());
        (context, vec![y, x, a, b])
    }

    fn registry(
        context: &StaticContext,
        resources: &[Resource],
    ) -> (Vec<ResolverResource>, HashMap<ResourceId, usize>) {
        let resolved: Vec<ResolverResource> = resources
            .iter()
            .map(|r| ResolverResource::new(r, context, true))
            .collect();
        let index = resolved
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id().clone(), i))
            .collect();
        (resolved, index)
    }

    #[test]
    fn consistent_space_reports_nothing() {
        let (context, resources) = fixture();
        let (resolved, index) = registry(&context, &resources);
        // Everyone's first candidate for pkg.u is y; a's view through pkg.q
        // agrees with b's direct import.
        let errors = PackageSpaces.check(Candidates::new(&resolved, &index), &context);
        assert!(errors.is_empty(), "got: {errors:?}");
    }

    #[test]
    fn diverged_pin_is_detected_with_both_blames() {
        let (context, resources) = fixture();
        let (mut resolved, index) = registry(&context, &resources);
        // Force a's pkg.u selection to x while b still selects y first.
        let a_row = resolved[2].table_mut().first_mut().unwrap();
        a_row.wires_mut()[0].disable("pinned elsewhere in this test");

        let errors = PackageSpaces.check(Candidates::new(&resolved, &index), &context);
        assert_eq!(errors.len(), 1);
        let error = &errors[0];
        assert_eq!(error.resource, rid("b:1.0.0"));
        assert_eq!(error.package, "pkg.u");
        assert_eq!(error.our_blame.capability.provider, rid("x:1.0.0"));
        assert_eq!(error.our_blame.requirements[0].resource, rid("a:1.0.0"));
        let other = error.other_blame.as_ref().unwrap();
        assert_eq!(other.capability.provider, rid("y:1.0.0"));
        assert_eq!(other.requirements[0].resource, rid("b:1.0.0"));
    }

    #[test]
    fn substitution_rows_are_exempt() {
        // host both exports and imports pkg.u; even if its import would pin
        // a different provider, the row is substitution and skipped.
        let mut other = Resource::new(rid("other:1.0.0"));
        other.export_package("pkg.u", []);
        let mut host = Resource::new(rid("host:1.0.0"));
        host.export_package("pkg.u", []);
        host.import_package("pkg.u");

        let mut context = StaticContext::new();
        context.add_mandatory(other.clone()).add_mandatory(host.clone());
        let (resolved, index) = registry(&context, &[other, host]);

        let errors = PackageSpaces.check(Candidates::new(&resolved, &index), &context);
        assert!(errors.is_empty());
    }

    #[test]
    fn violation_display_names_package_and_providers() {
        let (context, resources) = fixture();
        let (mut resolved, index) = registry(&context, &resources);
        let a_row = resolved[2].table_mut().first_mut().unwrap();
        a_row.wires_mut()[0].disable("pinned elsewhere in this test");

        let errors = PackageSpaces.check(Candidates::new(&resolved, &index), &context);
        let s = errors[0].to_string();
        assert!(s.contains("pkg.u"));
        assert!(s.contains("x:1.0.0"));
        assert!(s.contains("y:1.0.0"));
    }
}
