//! Module wiring resolver.
//!
//! Assigns exactly one provider to every requirement of a set of modules so
//! that no module ends up depending, directly or transitively, on two
//! different providers of the same package. Resolution is an incremental
//! heuristic fixpoint: per-module forward/backward uses-constraint
//! propagation, a global package-space consistency check, and blame-driven
//! cross-module narrowing with restart. It finds *a* consistent wiring, not
//! an optimal one, and never backtracks.

pub mod candidates;
pub mod consistency;
pub mod graph;
pub mod logger;
pub mod propagate;
pub mod report;
pub mod resolver;
pub mod resource;
pub mod wires;
