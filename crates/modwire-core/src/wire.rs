use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::requirement::Requirement;
use crate::resource::ResourceId;

/// A final binding of one requirement to one providing capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    pub requirement: Arc<Requirement>,
    pub capability: Arc<Capability>,
}

impl Wire {
    pub fn new(requirement: Arc<Requirement>, capability: Arc<Capability>) -> Self {
        Self {
            requirement,
            capability,
        }
    }

    pub fn requirer(&self) -> &ResourceId {
        &self.requirement.resource
    }

    pub fn provider(&self) -> &ResourceId {
        &self.capability.provider
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --> {}", self.requirement, self.capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_endpoints() {
        let app = ResourceId::parse("app:1.0.0").unwrap();
        let lib = ResourceId::parse("lib:2.0.0").unwrap();
        let wire = Wire::new(
            Arc::new(Requirement::package(app.clone(), "org.example.api")),
            Arc::new(Capability::package(lib.clone(), "org.example.api", [])),
        );
        assert_eq!(wire.requirer(), &app);
        assert_eq!(wire.provider(), &lib);
        assert!(wire.to_string().contains("-->"));
    }
}
