//! kube-lineage library
//!
//! Resolves the transitive dependents of a Kubernetes object from a snapshot
//! of cluster objects. It can be used both as a binary and as a library for
//! testing.

pub mod cli;
pub mod config;
pub mod graph;
pub mod kube;
pub mod relationships;

// Re-export commonly used types for convenience
pub use graph::{ClusterGraph, Node, NodeMap, ResolutionStats, resolve_dependents};
pub use relationships::default_registry;
