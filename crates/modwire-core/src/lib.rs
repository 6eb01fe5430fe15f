//! Core data types for the modwire module resolver.
//!
//! This crate defines the fundamental types shared by the resolver pipeline:
//! resource identities, capabilities and requirements, final wires, the
//! `ResolveContext` collaborator interface, and the error taxonomy.
//!
//! This crate is intentionally free of concurrency and I/O.

pub mod capability;
pub mod context;
pub mod errors;
pub mod namespace;
pub mod requirement;
pub mod resource;
pub mod wire;
