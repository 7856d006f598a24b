//! Loading a snapshot and locating the root object

use kube::core::DynamicObject;

use super::query::{QueryError, ResourceQuery};
use crate::graph::{ClusterGraph, ExtractorRegistry, NodeMap, Uid};
use crate::kube::{ObjectSource, SourceError};

#[derive(Debug, thiserror::Error)]
pub enum LineageError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// A snapshot of objects together with the root the user asked for
#[derive(Debug)]
pub struct Lineage {
    objects: Vec<DynamicObject>,
    root_uid: Uid,
}

impl Lineage {
    /// Fetch all objects from `source` and find the root named by `query`
    ///
    /// Namespaced roots are looked up in `namespace`, or in the source's
    /// default namespace when none is given.
    pub async fn load(
        source: &dyn ObjectSource,
        query: &ResourceQuery,
        namespace: Option<&str>,
    ) -> Result<Self, LineageError> {
        let objects = source.fetch().await?;
        let namespace = namespace
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| source.default_namespace());

        let root_uid = query
            .find_root(&objects, namespace)?
            .metadata
            .uid
            .clone()
            .unwrap_or_default();
        tracing::debug!("Found root {} (uid: {}) among {} objects", query, root_uid, objects.len());

        Ok(Self { objects, root_uid })
    }

    pub fn objects(&self) -> &[DynamicObject] {
        &self.objects
    }

    pub fn root_uid(&self) -> &str {
        &self.root_uid
    }

    /// Resolve the relationships of the whole snapshot
    pub fn graph(&self, registry: &ExtractorRegistry) -> ClusterGraph<'_> {
        ClusterGraph::build(&self.objects, registry)
    }

    /// The root and all of its transitive dependents
    pub fn dependents(&self, registry: &ExtractorRegistry) -> NodeMap<'_> {
        self.graph(registry).dependents_of(&self.root_uid)
    }
}
