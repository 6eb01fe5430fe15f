use std::fmt;

use serde::{Deserialize, Serialize};

/// The namespace a capability or requirement belongs to.
///
/// Only package-namespace capabilities carry a `uses` set and take part in
/// uses-constraint checking; bundle and host capabilities are wired but
/// otherwise opaque to the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Package,
    Bundle,
    Host,
}

impl Namespace {
    pub fn is_package(self) -> bool {
        self == Namespace::Package
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Package => "package",
            Namespace::Bundle => "bundle",
            Namespace::Host => "host",
        };
        write!(f, "{s}")
    }
}
