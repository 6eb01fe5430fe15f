//! Candidate state for a single requirement: the ordered wire list and the
//! per-wire disabled flag the whole pipeline revolves around.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use modwire_core::capability::Capability;
use modwire_core::requirement::Requirement;
use modwire_core::resource::ResourceId;
use modwire_core::wire::Wire;

/// One candidate pairing of a requirement with a capability.
///
/// The pairing itself is immutable; the only mutable state is the disabled
/// reason, and disabling is monotonic: once set, a wire never becomes
/// enabled again and the original reason is retained (first-reason-wins).
#[derive(Debug, Clone)]
pub struct ResolverWire {
    requirement: Arc<Requirement>,
    capability: Arc<Capability>,
    /// Cached from the capability; `None` unless package namespace.
    package_name: Option<String>,
    /// Cached from the capability; empty unless package namespace.
    uses: BTreeSet<String>,
    disabled: Option<String>,
}

impl ResolverWire {
    pub(crate) fn new(requirement: Arc<Requirement>, capability: Arc<Capability>) -> Self {
        let (package_name, uses) = if capability.namespace.is_package() {
            (
                capability.package_name().map(str::to_owned),
                capability.uses.clone(),
            )
        } else {
            (None, BTreeSet::new())
        };
        Self {
            requirement,
            capability,
            package_name,
            uses,
            disabled: None,
        }
    }

    pub fn requirement(&self) -> &Arc<Requirement> {
        &self.requirement
    }

    pub fn capability(&self) -> &Arc<Capability> {
        &self.capability
    }

    pub fn provider(&self) -> &ResourceId {
        &self.capability.provider
    }

    pub fn is_optional(&self) -> bool {
        self.requirement.optional
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    pub fn uses(&self) -> &BTreeSet<String> {
        &self.uses
    }

    pub fn is_enabled(&self) -> bool {
        self.disabled.is_none()
    }

    /// Disable this wire. Calling it again is not an error; the first
    /// reason is kept so the audit trail shows what struck the wire out.
    pub fn disable(&mut self, reason: impl Into<String>) {
        if self.disabled.is_none() {
            self.disabled = Some(reason.into());
        }
    }

    pub fn disabled_reason(&self) -> Option<&str> {
        self.disabled.as_deref()
    }

    /// The final-output form of this wire.
    pub fn to_wire(&self) -> Wire {
        Wire::new(self.requirement.clone(), self.capability.clone())
    }
}

impl fmt::Display for ResolverWire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --> {}", self.requirement, self.capability)
    }
}

/// The ordered candidate set for one requirement.
///
/// Candidate order is exactly the order the lookup collaborator returned and
/// is the resolver's tie-break: the first enabled wire wins. Membership
/// never changes after construction; only disabled flags do.
#[derive(Debug, Clone)]
pub struct Wires {
    requirement: Arc<Requirement>,
    wires: Vec<ResolverWire>,
    substitution: bool,
}

impl Wires {
    pub(crate) fn new(
        requirement: Arc<Requirement>,
        providers: Vec<Arc<Capability>>,
        substitution: bool,
    ) -> Self {
        let wires = providers
            .into_iter()
            .map(|capability| ResolverWire::new(requirement.clone(), capability))
            .collect();
        Self {
            requirement,
            wires,
            substitution,
        }
    }

    pub fn requirement(&self) -> &Arc<Requirement> {
        &self.requirement
    }

    /// True if any candidate is a package the requiring module itself
    /// exports; the global checker relaxes consistency for these.
    pub fn is_substitution(&self) -> bool {
        self.substitution
    }

    pub fn len(&self) -> usize {
        self.wires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wires.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolverWire> {
        self.wires.iter()
    }

    pub(crate) fn wires_mut(&mut self) -> &mut [ResolverWire] {
        &mut self.wires
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ResolverWire> {
        self.wires.iter().filter(|w| w.is_enabled())
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }

    pub fn first_enabled(&self) -> Option<&ResolverWire> {
        self.enabled().next()
    }

    /// The sole enabled wire, if exactly one remains.
    pub fn singleton(&self) -> Option<&ResolverWire> {
        let mut enabled = self.enabled();
        let first = enabled.next()?;
        if enabled.next().is_none() {
            Some(first)
        } else {
            None
        }
    }

    /// A requirement is a singleton once it is non-optional and reduced to
    /// exactly one enabled candidate.
    pub fn is_singleton(&self) -> bool {
        !self.requirement.optional && self.singleton().is_some()
    }

    /// Whether any candidate (enabled or not) comes from the given provider.
    pub fn provides_candidate(&self, provider: &ResourceId) -> bool {
        self.wires.iter().any(|w| w.provider() == provider)
    }

    /// Whether any still-enabled candidate comes from the given provider.
    pub fn provides_enabled_candidate(&self, provider: &ResourceId) -> bool {
        self.enabled().any(|w| w.provider() == provider)
    }
}
