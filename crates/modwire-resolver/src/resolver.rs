//! The resolver orchestrator: builds every module's candidate table, drives
//! local propagation, runs the global consistency check, and narrows other
//! modules' candidates along blame chains, restarting until stable.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use modwire_core::context::ResolveContext;
use modwire_core::errors::{ResolverError, ResolverResult};
use modwire_core::resource::{Resource, ResourceId};
use modwire_core::wire::Wire;
use rayon::prelude::*;

use crate::candidates::Candidates;
use crate::consistency::{Blame, ConsistencyCheck, PackageSpaces};
use crate::graph::WiringGraph;
use crate::logger::ResolveLog;
use crate::propagate::propagate;
use crate::report::{Problem, ProblemReport};
use crate::resource::ResolverResource;

/// Which resolution algorithm to run. Chosen once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Baseline: wire every requirement to its first candidate, with no
    /// constraint checking at all.
    FirstFit,
    /// Uses-constraint propagation with blame-driven restart.
    #[default]
    UseConstraints,
}

/// The output of one resolve invocation.
///
/// Partial success is a valid outcome: `wiring` holds whatever was achieved
/// and `report` holds the problems of the modules that were not.
#[derive(Debug)]
pub struct Resolution {
    pub wiring: BTreeMap<ResourceId, Vec<Wire>>,
    pub report: ProblemReport,
    /// Outer rounds it took to stabilize.
    pub rounds: usize,
}

impl Resolution {
    /// The wiring as a graph, for tree diagnostics.
    pub fn graph(&self) -> WiringGraph {
        WiringGraph::from_wiring(&self.wiring)
    }
}

pub struct Resolver {
    strategy: Strategy,
    checker: Box<dyn ConsistencyCheck>,
    cancel: Option<Arc<AtomicBool>>,
    log_dir: Option<PathBuf>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Strategy::default())
    }
}

impl Resolver {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            checker: Box::new(PackageSpaces),
            cancel: None,
            log_dir: None,
        }
    }

    /// Replace the global consistency checker.
    pub fn with_checker(mut self, checker: Box<dyn ConsistencyCheck>) -> Self {
        self.checker = checker;
        self
    }

    /// Cancellation flag, observed once per outer round.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Directory the per-module audit logs are flushed to.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed))
    }

    pub fn resolve(&self, context: &dyn ResolveContext) -> ResolverResult<Resolution> {
        match self.strategy {
            Strategy::FirstFit => self.resolve_first_fit(context),
            Strategy::UseConstraints => self.resolve_use_constraints(context),
        }
    }

    fn resolve_first_fit(&self, context: &dyn ResolveContext) -> ResolverResult<Resolution> {
        if self.is_cancelled() {
            return Err(ResolverError::Cancelled { round: 1 });
        }
        let mut report = ProblemReport::new();
        let mut wiring = BTreeMap::new();
        let resources = context
            .mandatory_resources()
            .iter()
            .chain(context.optional_resources().iter());
        for resource in resources {
            let mut wires = Vec::new();
            for requirement in &resource.requirements {
                if requirement.dynamic {
                    continue;
                }
                match context.find_providers(requirement).into_iter().next() {
                    Some(capability) => wires.push(Wire::new(requirement.clone(), capability)),
                    None if requirement.optional => {}
                    None => report.add(Problem::Unresolved {
                        resource: resource.id.clone(),
                        requirement: requirement.clone(),
                    }),
                }
            }
            wiring.insert(resource.id.clone(), wires);
        }
        Ok(Resolution {
            wiring,
            report,
            rounds: 1,
        })
    }

    fn resolve_use_constraints(&self, context: &dyn ResolveContext) -> ResolverResult<Resolution> {
        let mut log = match &self.log_dir {
            Some(dir) => ResolveLog::with_dir(dir),
            None => ResolveLog::new(),
        };
        tracing::debug!(
            existing_wirings = context.wirings().len(),
            mandatory = context.mandatory_resources().len(),
            optional = context.optional_resources().len(),
            "starting resolve"
        );

        let inputs: Vec<(&Resource, bool)> = context
            .mandatory_resources()
            .iter()
            .map(|r| (r, true))
            .chain(context.optional_resources().iter().map(|r| (r, false)))
            .collect();
        // Candidate discovery is read-only and per-module, so fan it out.
        // The ordered collect is the barrier: no propagation pass starts
        // before every table exists.
        let mut resources: Vec<ResolverResource> = inputs
            .par_iter()
            .map(|(resource, mandatory)| ResolverResource::new(resource, context, *mandatory))
            .collect();
        let index: HashMap<ResourceId, usize> = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id().clone(), i))
            .collect();
        for resource in &resources {
            let kind = if resource.is_mandatory() {
                "mandatory"
            } else {
                "optional"
            };
            log.log(resource.id(), format!("{kind} resource {}", resource.id()));
        }

        let total_candidates: usize = resources
            .iter()
            .map(ResolverResource::initial_candidate_count)
            .sum();
        // Every productive round disables at least one wire and disabling is
        // monotonic, so stabilization within the candidate count is certain.
        let max_rounds = total_candidates + 2;

        let mut report = ProblemReport::new();
        let mut round = 0;
        loop {
            round += 1;
            if self.is_cancelled() {
                log.flush();
                return Err(ResolverError::Cancelled { round });
            }
            if round > max_rounds {
                return Err(ResolverError::Internal {
                    message: format!("resolve did not stabilize within {max_rounds} rounds"),
                });
            }
            for resource in resources.iter_mut() {
                let id = resource.id().clone();
                log.log(&id, format!("--- initial state [round {round}] ---"));
                log.dump(resource);
                propagate(resource, &mut log)?;
                log.log(&id, format!("--- processed state [round {round}] ---"));
                log.dump(resource);
            }

            let errors = self
                .checker
                .check(Candidates::new(&resources, &index), context);
            if errors.is_empty() {
                break;
            }
            tracing::debug!(
                round,
                violations = errors.len(),
                "use-constraint violations after global check"
            );
            let mut restart = false;
            for error in &errors {
                log.log_error(error);
                if let Some(other_blame) = &error.other_blame {
                    if resolve_blame(
                        &error.our_blame,
                        other_blame,
                        &mut resources,
                        &index,
                        &mut log,
                    )? {
                        restart = true;
                    }
                }
            }
            if !restart {
                // Nothing left to narrow; the violations stand.
                for error in errors {
                    report.add(Problem::UseViolation(error));
                }
                break;
            }
        }

        let mut wiring = BTreeMap::new();
        for resource in resources.iter_mut() {
            let unresolved = resource.unresolved();
            if !unresolved.is_empty() {
                for requirement in unresolved {
                    log.log(
                        resource.id(),
                        format!("unresolved mandatory requirement {requirement}"),
                    );
                    report.add(Problem::Unresolved {
                        resource: resource.id().clone(),
                        requirement,
                    });
                }
                resource.mark_unresolvable();
            }
            wiring.insert(resource.id().clone(), resource.wires());
        }
        log.flush();
        tracing::debug!(
            rounds = round,
            modules = wiring.len(),
            problems = report.len(),
            "resolve finished"
        );
        Ok(Resolution {
            wiring,
            report,
            rounds: round,
        })
    }
}

/// Narrow another module's candidates along a blame chain.
///
/// Only acts when our blame traces to exactly one non-optional requirement
/// whose selection is a singleton: then any conflicting requirement in a
/// different module that still has our provider among its enabled candidates
/// loses every candidate from anyone else. If that requirement becomes a
/// singleton, the other module gets an immediate nested propagation pass.
fn resolve_blame(
    our_blame: &Blame,
    other_blame: &Blame,
    resources: &mut [ResolverResource],
    index: &HashMap<ResourceId, usize>,
    log: &mut ResolveLog,
) -> ResolverResult<bool> {
    let [source] = our_blame.requirements.as_slice() else {
        return Ok(false);
    };
    if source.optional {
        return Ok(false);
    }
    let Some(&our_idx) = index.get(&source.resource) else {
        return Ok(false);
    };
    if !resources[our_idx]
        .wires_for(source)
        .is_some_and(|w| w.is_singleton())
    {
        // Not pinned on our side; narrowing the other module is unjustified.
        return Ok(false);
    }
    let provider = our_blame.capability.provider.clone();
    let source_id = source.resource.clone();

    for other in &other_blame.requirements {
        if other.resource == source_id {
            continue;
        }
        log.log(
            &source_id,
            format!("try to modify {} requirement {other} ...", other.resource),
        );
        let Some(&other_idx) = index.get(&other.resource) else {
            return Ok(false);
        };
        let other_id = resources[other_idx].id().clone();
        let mut narrowed = false;
        match resources[other_idx].wires_for_mut(other) {
            Some(wires) if wires.enabled_count() > 1 => {
                if wires.provides_enabled_candidate(&provider) {
                    let reason = format!("conflicts with use of {source} from {source_id}");
                    let targets: Vec<usize> = wires
                        .iter()
                        .enumerate()
                        .filter(|(_, w)| w.is_enabled() && w.provider() != &provider)
                        .map(|(i, _)| i)
                        .collect();
                    for i in targets {
                        let line = format!(
                            "disable provider {} for requirement {other} because it {reason}",
                            wires.wires_mut()[i].capability()
                        );
                        wires.wires_mut()[i].disable(reason.clone());
                        log.log(&other_id, line);
                    }
                    narrowed = true;
                } else {
                    log.log(
                        &source_id,
                        "... not possible, our resource is not a provider of the alternatives!",
                    );
                }
            }
            _ => {
                log.log(&source_id, "... not possible, no alternatives!");
            }
        }
        if narrowed {
            if resources[other_idx]
                .wires_for(other)
                .is_some_and(|w| w.is_singleton())
            {
                propagate(&mut resources[other_idx], log)?;
            }
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modwire_core::context::StaticContext;

    #[test]
    fn default_strategy_is_use_constraints() {
        assert_eq!(Strategy::default(), Strategy::UseConstraints);
    }

    #[test]
    fn empty_context_resolves_to_empty_wiring() {
        let context = StaticContext::new();
        let resolution = Resolver::default().resolve(&context).unwrap();
        assert!(resolution.wiring.is_empty());
        assert!(resolution.report.is_empty());
        assert_eq!(resolution.rounds, 1);
    }

    #[test]
    fn cancellation_aborts_before_any_round() {
        let context = StaticContext::new();
        let flag = Arc::new(AtomicBool::new(true));
        let err = Resolver::default()
            .with_cancel(flag)
            .resolve(&context)
            .unwrap_err();
        assert!(matches!(err, ResolverError::Cancelled { round: 1 }));
    }
}
