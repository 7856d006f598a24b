//! Global object indices built once per resolution

use std::collections::HashMap;

use kube::core::{DynamicObject, SelectorExt};

use super::models::{LabelSelector, ReferenceKey, Uid};
use super::node::Node;

/// Label carrying a host node's hostname
pub const HOSTNAME_LABEL: &str = "kubernetes.io/hostname";

/// Arena of nodes plus lookup tables by UID and by reference key
///
/// Nodes live in a vector and the lookup tables store positions into it,
/// so edges between nodes never hold references to each other.
#[derive(Debug)]
pub(crate) struct GlobalIndex<'a> {
    nodes: Vec<Node<'a>>,
    by_uid: HashMap<Uid, usize>,
    by_key: HashMap<ReferenceKey, usize>,
    live: Vec<usize>,
    pub skipped: usize,
    pub shadowed: usize,
}

impl<'a> GlobalIndex<'a> {
    /// Index all objects in a single pass
    ///
    /// Objects without a UID cannot be the target of an edge and are skipped.
    /// On duplicate UIDs the last object wins; the earlier one is shadowed and
    /// takes no further part in resolution. Host nodes are additionally
    /// reachable by node name and hostname label, because node events address
    /// them that way. Those aliases never replace a real UID entry.
    pub fn build(objects: &'a [DynamicObject]) -> Self {
        let mut nodes = Vec::with_capacity(objects.len());
        let mut by_uid = HashMap::with_capacity(objects.len());
        let mut by_key = HashMap::with_capacity(objects.len());
        let mut aliases = Vec::new();
        let mut skipped = 0;

        for object in objects {
            let node = Node::new(object);
            if node.uid.is_empty() {
                tracing::debug!(
                    "Skipping {} \"{}\" in namespace \"{}\": object has no uid",
                    node.kind,
                    node.name,
                    node.namespace
                );
                skipped += 1;
                continue;
            }

            let ix = nodes.len();
            by_uid.insert(node.uid.clone(), ix);
            by_key.insert(node.reference_key(), ix);

            if node.group.is_empty() && node.kind == "Node" {
                aliases.push((node.name.clone(), ix));
                if let Some(hostname) = node.labels().get(HOSTNAME_LABEL) {
                    aliases.push((hostname.clone(), ix));
                }
            }
            nodes.push(node);
        }

        let live: Vec<usize> = (0..nodes.len())
            .filter(|ix| by_uid.get(&nodes[*ix].uid) == Some(ix))
            .collect();
        let shadowed = nodes.len() - live.len();
        if shadowed > 0 {
            let mut is_live = vec![false; nodes.len()];
            for ix in &live {
                is_live[*ix] = true;
            }
            by_key.retain(|_, ix| is_live[*ix]);
            aliases.retain(|(_, ix)| is_live[*ix]);
        }
        for (alias, ix) in aliases {
            by_uid.entry(alias).or_insert(ix);
        }

        tracing::debug!(
            "Indexed {} objects ({} without uid, {} shadowed by duplicate uid)",
            live.len(),
            skipped,
            shadowed
        );

        Self {
            nodes,
            by_uid,
            by_key,
            live,
            skipped,
            shadowed,
        }
    }

    pub fn by_uid(&self, uid: &str) -> Option<usize> {
        self.by_uid.get(uid).copied()
    }

    pub fn by_key(&self, key: &ReferenceKey) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, uid: &str) -> Option<&Node<'a>> {
        self.by_uid(uid).map(|ix| &self.nodes[ix])
    }

    pub fn node(&self, ix: usize) -> &Node<'a> {
        &self.nodes[ix]
    }

    pub fn node_mut(&mut self, ix: usize) -> &mut Node<'a> {
        &mut self.nodes[ix]
    }

    /// Positions of every node that owns its UID entry
    pub fn live(&self) -> &[usize] {
        &self.live
    }

    /// Nodes matched by a label selector
    ///
    /// Scans every live node, so the cost is linear in the snapshot size.
    pub fn select(&self, selector: &LabelSelector) -> Vec<usize> {
        self.live
            .iter()
            .copied()
            .filter(|ix| {
                let n = &self.nodes[*ix];
                n.group == selector.group
                    && n.kind == selector.kind
                    && n.namespace == selector.namespace
                    && selector.selector.matches(n.labels())
            })
            .collect()
    }
}
