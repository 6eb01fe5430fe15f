//! Per-resolve problem collection: unresolved mandatory requirements and
//! use-constraint violations that blame resolution could not eliminate.
//!
//! Problems are not fatal; they accompany whatever wiring was achieved for
//! the unaffected modules.

use std::fmt;
use std::sync::Arc;

use modwire_core::requirement::Requirement;
use modwire_core::resource::ResourceId;
use serde::Serialize;

use crate::consistency::UseConstraintError;

/// A single recorded problem.
#[derive(Debug, Clone, Serialize)]
pub enum Problem {
    /// A non-optional requirement ended with zero enabled candidates.
    Unresolved {
        resource: ResourceId,
        requirement: Arc<Requirement>,
    },
    /// A global consistency error that survived blame resolution.
    UseViolation(UseConstraintError),
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Unresolved {
                resource,
                requirement,
            } => write!(f, "{resource}: unresolved requirement {requirement}"),
            Problem::UseViolation(error) => write!(f, "{error}"),
        }
    }
}

/// All problems recorded during one resolve.
#[derive(Debug, Default, Serialize)]
pub struct ProblemReport {
    pub problems: Vec<Problem>,
}

impl ProblemReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    /// Modules with at least one unresolved mandatory requirement.
    pub fn unresolved(&self) -> impl Iterator<Item = (&ResourceId, &Arc<Requirement>)> {
        self.problems.iter().filter_map(|p| match p {
            Problem::Unresolved {
                resource,
                requirement,
            } => Some((resource, requirement)),
            _ => None,
        })
    }

    pub fn violations(&self) -> impl Iterator<Item = &UseConstraintError> {
        self.problems.iter().filter_map(|p| match p {
            Problem::UseViolation(error) => Some(error),
            _ => None,
        })
    }
}

impl fmt::Display for ProblemReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.problems.is_empty() {
            return write!(f, "No resolution problems.");
        }
        writeln!(f, "Resolution problems ({}):", self.problems.len())?;
        for problem in &self.problems {
            writeln!(f, "  {problem}")?;
        }
        Ok(())
    }
}
