//! Per-module uses-constraint propagation: forward and backward checks run
//! alternately until a local fixpoint.
//!
//! Both checks only ever disable wires. Disabling is monotonic and the
//! candidate count is finite, so the fixpoint is reached within a bound
//! derived from the module's initial candidate count; exceeding the bound
//! means the monotonicity invariant broke and is a fatal internal error.

use modwire_core::errors::{ResolverError, ResolverResult};

use crate::logger::ResolveLog;
use crate::resource::{ResolverResource, SingletonWire};

/// Run forward/backward checks on one module until neither disables a wire.
pub fn propagate(resource: &mut ResolverResource, log: &mut ResolveLog) -> ResolverResult<()> {
    let id = resource.id().clone();
    log.log(&id, format!("== resolve {id} =="));
    let before = resource.count_unique_selected();
    let limit = resource.initial_candidate_count() + 2;
    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > limit {
            return Err(ResolverError::Internal {
                message: format!(
                    "local fixpoint for {id} did not converge within {limit} iterations"
                ),
            });
        }
        log.log(&id, "> check forward constraints <");
        let mut rerun = forward_pass(resource, log);
        log.log(&id, "> check backward constraints <");
        rerun |= backward_pass(resource, log);
        if !rerun {
            break;
        }
        log.log(&id, "> rerun needed <");
    }
    let after = resource.count_unique_selected();
    if after != before {
        log.log(&id, format!("{after} unique selected now (was {before})"));
        tracing::trace!(resource = %id, before, after, "propagation narrowed candidates");
    }
    Ok(())
}

/// Forward check: for every requirement still holding more than one enabled
/// wire, disable any wire whose package sits in the `uses` set of a
/// singleton from a different provider, when that provider is itself among
/// the requirement's candidates. Each new singleton grows the singleton set,
/// so the pass repeats until none forms.
///
/// Returns whether any requirement became a singleton.
fn forward_pass(resource: &mut ResolverResource, log: &mut ResolveLog) -> bool {
    let id = resource.id().clone();
    let mut changed = false;
    loop {
        let singletons = resource.singletons();
        if singletons.is_empty() {
            return changed;
        }
        log.log(
            &id,
            format!(
                "filtering uses-constraints against {} singletons...",
                singletons.len()
            ),
        );
        let mut rerun = false;
        for wires in resource.table_mut() {
            if wires.enabled_count() <= 1 {
                continue;
            }
            log.log(
                &id,
                format!(
                    "- must resolve {} with {} providers",
                    wires.requirement(),
                    wires.enabled_count()
                ),
            );
            let mut disables: Vec<(usize, String)> = Vec::new();
            for (i, wire) in wires.iter().enumerate() {
                if !wire.is_enabled() {
                    continue;
                }
                let Some(package) = wire.package_name() else {
                    continue;
                };
                let conflict = singletons.iter().find(|s| {
                    s.uses.contains(package)
                        && &s.provider != wire.provider()
                        && wires.provides_candidate(&s.provider)
                });
                if let Some(singleton) = conflict {
                    disables.push((i, forward_reason(singleton)));
                }
            }
            for (i, reason) in disables {
                log.log(&id, format!("\tdisable {}: {reason}", wires.wires_mut()[i]));
                wires.wires_mut()[i].disable(reason);
            }
            if wires.is_singleton() {
                log.log(&id, "-> is now a singleton!");
                rerun = true;
                changed = true;
            }
        }
        if !rerun {
            return changed;
        }
    }
}

fn forward_reason(singleton: &SingletonWire) -> String {
    format!(
        "uses-constraint conflict with import '{}' that is provided by {} and no other \
         alternative can be selected because it is also a provider for this package",
        singleton
            .package_name
            .as_deref()
            .unwrap_or(&singleton.requirement.name),
        singleton.provider
    )
}

/// Backward check: symmetric to the forward check, over the wire's own
/// `uses` set against existing singleton package names. Disables at most one
/// wire, then reports back so the forward check reruns first.
fn backward_pass(resource: &mut ResolverResource, log: &mut ResolveLog) -> bool {
    let singletons = resource.singletons();
    if singletons.is_empty() {
        return false;
    }
    let id = resource.id().clone();
    for wires in resource.table_mut() {
        if wires.enabled_count() <= 1 {
            continue;
        }
        let mut hit: Option<(usize, String)> = None;
        for (i, wire) in wires.iter().enumerate() {
            if !wire.is_enabled() {
                continue;
            }
            let conflict = singletons.iter().find(|s| {
                s.package_name
                    .as_deref()
                    .is_some_and(|p| wire.uses().contains(p))
                    && wires.provides_enabled_candidate(&s.provider)
                    && &s.provider != wire.provider()
            });
            if let Some(singleton) = conflict {
                let package = singleton.package_name.clone().unwrap_or_default();
                hit = Some((
                    i,
                    format!(
                        "violates the uses-constraint because it uses package '{package}' \
                         that is uniquely provided by {} already",
                        singleton.provider
                    ),
                ));
                break;
            }
        }
        if let Some((i, reason)) = hit {
            log.log(&id, format!("\tdisable {}: {reason}", wires.wires_mut()[i]));
            wires.wires_mut()[i].disable(reason);
            return true;
        }
    }
    false
}
