//! Relationship resolution over a cluster snapshot
//!
//! Turns owner references and extractor declarations into `dependents` edges
//! on the nodes of a [`ClusterGraph`].

use kube::core::DynamicObject;
use serde::Serialize;

use super::index::GlobalIndex;
use super::models::{CONTROLLER_REF, OWNER_REF, RelationshipSet};
use super::node::{Node, NodeMap};
use super::registry::ExtractorRegistry;
use super::relationship_map::RelationshipMap;

/// Counts of relationships that were dropped or failed during resolution
///
/// None of these are errors: a partial snapshot legitimately leaves some
/// addresses unresolved. Consistently high counts usually point at a missing
/// namespace or resource type in the fetched objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionStats {
    /// Objects that took part in resolution
    pub indexed_objects: usize,
    /// Objects skipped because they have no uid
    pub skipped_objects: usize,
    /// Objects hidden by a later object with the same uid
    pub shadowed_objects: usize,
    /// Objects whose extractor succeeded
    pub extracted_objects: usize,
    pub extractor_failures: usize,
    pub dangling_owner_references: usize,
    pub unresolved_references: usize,
    pub unresolved_uids: usize,
    /// Selector declarations that matched no object
    pub unmatched_selectors: usize,
    /// Distinct (node, dependent) pairs in the graph
    pub edges: usize,
}

impl ResolutionStats {
    /// Total declarations and references that were dropped
    pub fn dropped(&self) -> usize {
        self.dangling_owner_references
            + self.unresolved_references
            + self.unresolved_uids
            + self.unmatched_selectors
    }
}

/// Fully resolved relationship graph of a cluster snapshot
///
/// Read-only once built, so dependents of several roots can be computed
/// concurrently from the same graph.
#[derive(Debug)]
pub struct ClusterGraph<'a> {
    pub(super) index: GlobalIndex<'a>,
    stats: ResolutionStats,
}

impl<'a> ClusterGraph<'a> {
    /// Index `objects` and resolve all of their relationships
    pub fn build(objects: &'a [DynamicObject], registry: &ExtractorRegistry) -> Self {
        let mut index = GlobalIndex::build(objects);
        let mut stats = ResolutionStats {
            indexed_objects: index.live().len(),
            skipped_objects: index.skipped,
            shadowed_objects: index.shadowed,
            ..Default::default()
        };

        materialize_owner_references(&mut index, &mut stats);

        for ix in index.live().to_vec() {
            let node = index.node(ix);
            let Some(extractor) = registry.get(&node.group, &node.kind) else {
                continue;
            };
            match extractor.extract(node) {
                Ok(rmap) => {
                    stats.extracted_objects += 1;
                    update_relationships(&mut index, ix, &rmap, &mut stats);
                }
                Err(e) => {
                    stats.extractor_failures += 1;
                    if node.namespace.is_empty() {
                        tracing::debug!(
                            "Failed to get relationships for {} named \"{}\": {}",
                            node.kind.to_lowercase(),
                            node.name,
                            e
                        );
                    } else {
                        tracing::debug!(
                            "Failed to get relationships for {} named \"{}\" in namespace \"{}\": {}",
                            node.kind.to_lowercase(),
                            node.name,
                            node.namespace,
                            e
                        );
                    }
                }
            }
        }

        stats.edges = index
            .live()
            .iter()
            .map(|ix| index.node(*ix).dependents.len())
            .sum();

        tracing::debug!(?stats, "Resolved relationships");
        Self { index, stats }
    }

    pub fn stats(&self) -> &ResolutionStats {
        &self.stats
    }

    /// Look up a node by uid, or by host alias for nodes
    pub fn node(&self, uid: &str) -> Option<&Node<'a>> {
        self.index.get(uid)
    }

    /// All resolved nodes in input order
    pub fn nodes(&self) -> impl Iterator<Item = &Node<'a>> {
        self.index.live().iter().map(|ix| self.index.node(*ix))
    }

    /// The full graph as a node map
    pub fn to_node_map(&self) -> NodeMap<'a> {
        self.nodes().map(|n| (n.uid.clone(), n.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.index.live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve all dependents of the root object
///
/// Returns the root and every object that transitively depends on it. An
/// unknown root, or an empty input, yields an empty map.
pub fn resolve_dependents<'a>(
    objects: &'a [DynamicObject],
    root_uid: &str,
    registry: &ExtractorRegistry,
) -> NodeMap<'a> {
    ClusterGraph::build(objects, registry).dependents_of(root_uid)
}

/// Owner-dependent relationships from `metadata.ownerReferences`
fn materialize_owner_references(index: &mut GlobalIndex<'_>, stats: &mut ResolutionStats) {
    for ix in index.live().to_vec() {
        let node = index.node(ix);
        let uid = node.uid.clone();
        let owners: Vec<(usize, bool)> = node
            .owner_references
            .iter()
            .filter_map(|r| match index.by_uid(&r.uid) {
                Some(owner) => Some((owner, r.controller == Some(true))),
                None => {
                    stats.dangling_owner_references += 1;
                    None
                }
            })
            .collect();

        for (owner, controller) in owners {
            let owner = index.node_mut(owner);
            if controller {
                owner.add_dependent(&uid, CONTROLLER_REF);
            }
            owner.add_dependent(&uid, OWNER_REF);
        }
    }
}

fn add_dependents(node: &mut Node<'_>, uid: &str, rset: &RelationshipSet) {
    for r in rset {
        node.add_dependent(uid, r.clone());
    }
}

/// Merge one node's declarations into the graph
///
/// Dependencies add the declaring node as a dependent of the target, while
/// dependents add the target to the declaring node.
fn update_relationships(
    index: &mut GlobalIndex<'_>,
    ix: usize,
    rmap: &RelationshipMap,
    stats: &mut ResolutionStats,
) {
    let uid = index.node(ix).uid.clone();

    for (key, rset) in &rmap.dependencies_by_ref {
        match index.by_key(key) {
            Some(target) => add_dependents(index.node_mut(target), &uid, rset),
            None => stats.unresolved_references += 1,
        }
    }
    for (key, rset) in &rmap.dependents_by_ref {
        match index.by_key(key) {
            Some(target) => {
                let target_uid = index.node(target).uid.clone();
                add_dependents(index.node_mut(ix), &target_uid, rset);
            }
            None => stats.unresolved_references += 1,
        }
    }

    for (key, rset) in &rmap.dependencies_by_label_selector {
        let targets = rmap
            .label_selectors
            .get(key)
            .map(|s| index.select(s))
            .unwrap_or_default();
        if targets.is_empty() {
            stats.unmatched_selectors += 1;
        }
        for target in targets {
            add_dependents(index.node_mut(target), &uid, rset);
        }
    }
    for (key, rset) in &rmap.dependents_by_label_selector {
        let targets = rmap
            .label_selectors
            .get(key)
            .map(|s| index.select(s))
            .unwrap_or_default();
        if targets.is_empty() {
            stats.unmatched_selectors += 1;
        }
        for target in targets {
            let target_uid = index.node(target).uid.clone();
            add_dependents(index.node_mut(ix), &target_uid, rset);
        }
    }

    for (dependency_uid, rset) in &rmap.dependencies_by_uid {
        match index.by_uid(dependency_uid) {
            Some(target) => add_dependents(index.node_mut(target), &uid, rset),
            None => stats.unresolved_uids += 1,
        }
    }
    for (dependent_uid, rset) in &rmap.dependents_by_uid {
        match index.by_uid(dependent_uid) {
            Some(target) => {
                let target_uid = index.node(target).uid.clone();
                add_dependents(index.node_mut(ix), &target_uid, rset);
            }
            None => stats.unresolved_uids += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::models::Reference;
    use crate::graph::registry::{ExtractError, ExtractResult};
    use serde_json::json;

    fn object(value: serde_json::Value) -> DynamicObject {
        serde_json::from_value(value).unwrap()
    }

    fn config_map(name: &str, uid: &str) -> DynamicObject {
        object(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": name, "namespace": "default", "uid": uid},
        }))
    }

    fn pod(name: &str, uid: &str) -> DynamicObject {
        object(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": name, "namespace": "default", "uid": uid},
            "spec": {"configMap": "settings"}
        }))
    }

    fn pod_uses_config_map(node: &Node<'_>) -> ExtractResult {
        let mut rmap = RelationshipMap::new();
        let name = node.nested_string(&["spec", "configMap"]);
        rmap.add_dependency_by_ref(&Reference::new("", "ConfigMap", &node.namespace, name), "PodVolume");
        rmap.add_dependency_by_ref(&Reference::new("", "Secret", &node.namespace, "absent"), "PodVolume");
        Ok(rmap)
    }

    fn always_fails(_: &Node<'_>) -> ExtractResult {
        Err(ExtractError::MissingField("spec".to_string()))
    }

    #[test]
    fn test_dependency_declaration_creates_reverse_edge() {
        let objects = vec![config_map("settings", "cm-1"), pod("web-0", "pod-1")];
        let mut registry = ExtractorRegistry::new();
        registry.register("", "Pod", pod_uses_config_map);

        let graph = ClusterGraph::build(&objects, &registry);

        let cm = graph.node("cm-1").unwrap();
        assert!(cm.dependents["pod-1"].contains("PodVolume"));
        assert!(graph.node("pod-1").unwrap().dependents.is_empty());
        assert_eq!(graph.stats().unresolved_references, 1);
        assert_eq!(graph.stats().extracted_objects, 1);
        assert_eq!(graph.stats().edges, 1);
    }

    #[test]
    fn test_failed_extractor_keeps_owner_edges() {
        let mut child = pod("web-0", "pod-1");
        child.metadata.owner_references = Some(vec![
            serde_json::from_value(json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "name": "settings",
                "uid": "cm-1"
            }))
            .unwrap(),
        ]);
        let objects = vec![config_map("settings", "cm-1"), child];
        let mut registry = ExtractorRegistry::new();
        registry.register("", "Pod", always_fails);

        let graph = ClusterGraph::build(&objects, &registry);

        assert_eq!(graph.stats().extractor_failures, 1);
        let rset = &graph.node("cm-1").unwrap().dependents["pod-1"];
        assert_eq!(rset.list(), vec!["OwnerRef"]);
    }

    #[test]
    fn test_empty_input() {
        let graph = ClusterGraph::build(&[], &ExtractorRegistry::new());
        assert!(graph.is_empty());
        assert_eq!(graph.stats(), &ResolutionStats::default());
        assert!(graph.to_node_map().is_empty());
    }

    #[test]
    fn test_dropped_sums_unresolved_counts() {
        let stats = ResolutionStats {
            dangling_owner_references: 1,
            unresolved_references: 2,
            unresolved_uids: 3,
            unmatched_selectors: 4,
            extractor_failures: 10,
            ..Default::default()
        };
        assert_eq!(stats.dropped(), 10);
    }
}
