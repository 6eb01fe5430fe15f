use std::fmt;
use std::sync::Arc;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::namespace::Namespace;
use crate::requirement::Requirement;

/// Identity of a module: symbolic name plus version.
///
/// Cheap to clone; used as the registry key wherever the resolver needs to
/// reference a module across tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub symbolic_name: String,
    pub version: Version,
}

impl ResourceId {
    pub fn new(symbolic_name: impl Into<String>, version: Version) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            version,
        }
    }

    /// Parse `"name:1.2.3"` into an identity.
    pub fn parse(s: &str) -> Option<Self> {
        let (name, version) = s.split_once(':')?;
        if name.is_empty() {
            return None;
        }
        let version = Version::parse(version).ok()?;
        Some(Self::new(name, version))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbolic_name, self.version)
    }
}

/// A module offered to the resolver: its identity, the capabilities it
/// provides, and the requirements it needs satisfied.
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: ResourceId,
    pub capabilities: Vec<Arc<Capability>>,
    pub requirements: Vec<Arc<Requirement>>,
}

impl Resource {
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            capabilities: Vec::new(),
            requirements: Vec::new(),
        }
    }

    /// Declare a package export with its `uses` set.
    pub fn export_package<'u>(
        &mut self,
        package: &str,
        uses: impl IntoIterator<Item = &'u str>,
    ) -> &mut Self {
        self.capabilities
            .push(Arc::new(Capability::package(self.id.clone(), package, uses)));
        self
    }

    /// Declare a non-package capability (bundle or host namespace).
    pub fn provide(&mut self, namespace: Namespace, name: &str) -> &mut Self {
        self.capabilities
            .push(Arc::new(Capability::new(self.id.clone(), namespace, name)));
        self
    }

    /// Declare a mandatory package import.
    pub fn import_package(&mut self, package: &str) -> &mut Self {
        self.requirements
            .push(Arc::new(Requirement::package(self.id.clone(), package)));
        self
    }

    /// Declare an arbitrary requirement.
    pub fn require(&mut self, requirement: Requirement) -> &mut Self {
        self.requirements.push(Arc::new(requirement));
        self
    }

    /// Whether this module itself exports the given package.
    pub fn exports_package(&self, package: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.package_name() == Some(package))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
