use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::namespace::Namespace;
use crate::resource::ResourceId;

/// Attribute key carrying a capability's primary name in every namespace.
pub const ATTR_NAME: &str = "name";

/// A typed fact a module provides, e.g. "exports package org.example.api".
///
/// Immutable once handed to the resolver; shared behind `Arc`. The `uses`
/// set is only meaningful for package-namespace capabilities and names the
/// packages this capability's API structurally depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub provider: ResourceId,
    pub namespace: Namespace,
    pub attributes: BTreeMap<String, String>,
    pub uses: BTreeSet<String>,
}

impl Capability {
    pub fn new(provider: ResourceId, namespace: Namespace, name: &str) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(ATTR_NAME.to_string(), name.to_string());
        Self {
            provider,
            namespace,
            attributes,
            uses: BTreeSet::new(),
        }
    }

    /// A package export with its `uses` set.
    pub fn package<'u>(
        provider: ResourceId,
        package: &str,
        uses: impl IntoIterator<Item = &'u str>,
    ) -> Self {
        let mut capability = Self::new(provider, Namespace::Package, package);
        capability.uses = uses.into_iter().map(str::to_owned).collect();
        capability
    }

    /// The capability's primary name attribute, if declared.
    pub fn name(&self) -> Option<&str> {
        self.attributes.get(ATTR_NAME).map(String::as_str)
    }

    /// The exported package name; `None` for non-package namespaces.
    pub fn package_name(&self) -> Option<&str> {
        if self.namespace.is_package() {
            self.name()
        } else {
            None
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={} [{}]",
            self.namespace,
            self.name().unwrap_or("?"),
            self.provider
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ResourceId {
        ResourceId::parse("lib:1.0.0").unwrap()
    }

    #[test]
    fn package_capability_has_package_name() {
        let cap = Capability::package(provider(), "org.example.api", ["org.example.base"]);
        assert_eq!(cap.package_name(), Some("org.example.api"));
        assert!(cap.uses.contains("org.example.base"));
    }

    #[test]
    fn bundle_capability_has_no_package_name() {
        let cap = Capability::new(provider(), Namespace::Bundle, "lib");
        assert_eq!(cap.name(), Some("lib"));
        assert_eq!(cap.package_name(), None);
        assert!(cap.uses.is_empty());
    }

    #[test]
    fn display_includes_namespace_and_provider() {
        let cap = Capability::package(provider(), "org.example.api", []);
        let s = cap.to_string();
        assert!(s.contains("package=org.example.api"));
        assert!(s.contains("lib:1.0.0"));
    }
}
