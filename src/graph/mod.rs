//! Relationship graph of Kubernetes objects
//!
//! Given a snapshot of cluster objects, builds the graph of "depends on"
//! relationships between them and extracts the transitive dependents of a
//! root object. Relationships come from two places:
//!
//! - owner references, which every object carries
//! - per-kind extractors looked up in an [`ExtractorRegistry`], which declare
//!   relationships by reference, by uid or by label selector
//!
//! Edges are stored on nodes as `dependents` keyed by uid, and a dependency
//! declared by an object is stored as a dependent edge on the target.

mod index;
mod models;
mod node;
mod registry;
mod relationship_map;
mod resolver;
mod traversal;

pub use index::HOSTNAME_LABEL;
pub use models::{
    CONTROLLER_REF, LabelSelector, LabelSelectorKey, OWNER_REF, Reference, ReferenceKey,
    Relationship, RelationshipSet, Uid,
};
pub use node::{Node, NodeMap, group_of, nested_slice, nested_str, nested_value};
pub use registry::{ExtractError, ExtractResult, Extractor, ExtractorRegistry, GroupKind};
pub use relationship_map::RelationshipMap;
pub use resolver::{ClusterGraph, ResolutionStats, resolve_dependents};
