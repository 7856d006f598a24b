//! Rendering of resolved dependents
//!
//! `tree` prints an indented table in the style of `kubectl get`; `json`
//! prints every node with its dependent edges.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::graph::{Node, NodeMap, RelationshipSet};

/// Gap between table columns
const COLUMN_GAP: &str = "   ";

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Qualify names with their API group (`Deployment.apps/web`)
    pub show_group: bool,
}

struct Row {
    namespace: String,
    name: String,
    relationships: String,
}

/// Render the dependents of `root_uid` as a tree table
///
/// Children are ordered by namespace, kind, group and name. An object that
/// is already on the path from the root is printed again but not expanded,
/// so cycles terminate.
pub fn render_tree(nodes: &NodeMap<'_>, root_uid: &str, options: RenderOptions) -> String {
    let Some(root) = nodes.get(root_uid) else {
        return String::new();
    };

    let mut rows = vec![Row {
        namespace: root.namespace.clone(),
        name: display_name(root, options),
        relationships: String::new(),
    }];
    let mut path = HashSet::from([root.uid.as_str()]);
    push_children(nodes, root, "", &mut path, options, &mut rows);

    format_table(&rows)
}

fn push_children<'n>(
    nodes: &'n NodeMap<'_>,
    parent: &'n Node<'_>,
    prefix: &str,
    path: &mut HashSet<&'n str>,
    options: RenderOptions,
    rows: &mut Vec<Row>,
) {
    let mut children: Vec<(&'n Node<'_>, &'n RelationshipSet)> = parent
        .dependents
        .iter()
        .filter_map(|(uid, rset)| nodes.get(uid).map(|child| (child, rset)))
        .collect();
    children.sort_by(|(a, _), (b, _)| {
        (&a.namespace, &a.kind, &a.group, &a.name, &a.uid)
            .cmp(&(&b.namespace, &b.kind, &b.group, &b.name, &b.uid))
    });

    let count = children.len();
    for (i, (child, rset)) in children.into_iter().enumerate() {
        let last = i + 1 == count;
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };

        rows.push(Row {
            namespace: child.namespace.clone(),
            name: format!("{prefix}{branch}{}", display_name(child, options)),
            relationships: rset.to_string(),
        });

        if path.insert(child.uid.as_str()) {
            push_children(nodes, child, &format!("{prefix}{indent}"), path, options, rows);
            path.remove(child.uid.as_str());
        }
    }
}

fn display_name(node: &Node<'_>, options: RenderOptions) -> String {
    if options.show_group && !node.group.is_empty() {
        format!("{}.{}/{}", node.kind, node.group, node.name)
    } else {
        format!("{}/{}", node.kind, node.name)
    }
}

fn format_table(rows: &[Row]) -> String {
    let header = Row {
        namespace: "NAMESPACE".to_string(),
        name: "NAME".to_string(),
        relationships: "RELATIONSHIPS".to_string(),
    };
    let width = |f: fn(&Row) -> &str| {
        std::iter::once(&header)
            .chain(rows)
            .map(|row| f(row).chars().count())
            .max()
            .unwrap_or(0)
    };
    let namespace_width = width(|row| row.namespace.as_str());
    let name_width = width(|row| row.name.as_str());

    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows) {
        let line = format!(
            "{}{gap}{}{gap}{}",
            pad(&row.namespace, namespace_width),
            pad(&row.name, name_width),
            row.relationships,
            gap = COLUMN_GAP
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Left-align by character count; tree glyphs are multi-byte
fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    format!("{value}{}", " ".repeat(width.saturating_sub(len)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeView<'n> {
    uid: &'n str,
    group: &'n str,
    kind: &'n str,
    namespace: &'n str,
    name: &'n str,
    dependents: BTreeMap<&'n str, Vec<&'n str>>,
}

/// Render every node as a pretty-printed JSON array, ordered by uid
pub fn render_json(nodes: &NodeMap<'_>) -> serde_json::Result<String> {
    let views: Vec<NodeView<'_>> = nodes
        .values()
        .map(|node| NodeView {
            uid: &node.uid,
            group: &node.group,
            kind: &node.kind,
            namespace: &node.namespace,
            name: &node.name,
            dependents: node
                .dependents
                .iter()
                .map(|(uid, rset)| (uid.as_str(), rset.list()))
                .collect(),
        })
        .collect();
    serde_json::to_string_pretty(&views)
}
