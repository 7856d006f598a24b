//! Dependent-set traversal

use std::collections::{HashSet, VecDeque};

use super::node::NodeMap;
use super::resolver::ClusterGraph;

impl<'a> ClusterGraph<'a> {
    /// Collect the root and all of its transitive dependents
    ///
    /// Breadth-first over `dependents` edges. The graph may contain cycles, so
    /// every uid is visited at most once; duplicates in the queue are dropped
    /// when popped.
    pub fn dependents_of(&self, root_uid: &str) -> NodeMap<'a> {
        let mut node_map = NodeMap::new();
        let mut uid_queue: VecDeque<&str> = VecDeque::new();
        let mut uid_set: HashSet<&str> = HashSet::new();

        if let Some(root) = self.index.get(root_uid) {
            uid_queue.push_back(&root.uid);
        }

        while let Some(uid) = uid_queue.pop_front() {
            // Guard against cyclic dependencies
            if !uid_set.insert(uid) {
                continue;
            }
            let Some(node) = self.index.get(uid) else {
                continue;
            };
            uid_queue.extend(node.dependents.keys().map(String::as_str));
            node_map.insert(node.uid.clone(), node.clone());
        }

        tracing::debug!(
            "Resolved {} dependents for root object (uid: {})",
            node_map.len().saturating_sub(1),
            root_uid
        );
        node_map
    }
}
