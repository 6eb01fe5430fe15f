use std::fmt;

use serde::{Deserialize, Serialize};

use crate::namespace::Namespace;
use crate::resource::ResourceId;

/// A typed need a module has, satisfied by wiring it to one capability.
///
/// Dynamic requirements are excluded from static resolution entirely;
/// optional requirements may end up with no wire without failing the module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    /// The requesting module.
    pub resource: ResourceId,
    pub namespace: Namespace,
    /// Exact name the candidate capability must carry.
    pub name: String,
    pub optional: bool,
    pub dynamic: bool,
}

impl Requirement {
    pub fn new(resource: ResourceId, namespace: Namespace, name: &str) -> Self {
        Self {
            resource,
            namespace,
            name: name.to_string(),
            optional: false,
            dynamic: false,
        }
    }

    /// A mandatory static package import.
    pub fn package(resource: ResourceId, package: &str) -> Self {
        Self::new(resource, Namespace::Package, package)
    }

    pub fn with_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} <{}>", self.namespace, self.name, self.resource)?;
        if self.optional {
            write!(f, " (optional)")?;
        }
        if self.dynamic {
            write!(f, " (dynamic)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_requirement_defaults() {
        let req = Requirement::package(ResourceId::parse("app:1.0.0").unwrap(), "org.example.api");
        assert_eq!(req.namespace, Namespace::Package);
        assert!(!req.optional);
        assert!(!req.dynamic);
    }

    #[test]
    fn flags_compose() {
        let req = Requirement::package(ResourceId::parse("app:1.0.0").unwrap(), "org.example.api")
            .with_optional()
            .with_dynamic();
        assert!(req.optional);
        assert!(req.dynamic);
        let s = req.to_string();
        assert!(s.contains("(optional)"));
        assert!(s.contains("(dynamic)"));
    }
}
