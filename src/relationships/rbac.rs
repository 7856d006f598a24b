//! Extractors for rbac.authorization.k8s.io kinds

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector as MetaLabelSelector;
use kube::core::Selector;

use super::{
    CLUSTER_ROLE_AGGREGATION_RULE, CLUSTER_ROLE_BINDING_ROLE, CLUSTER_ROLE_BINDING_SUBJECT,
    RBAC_GROUP, ROLE_BINDING_ROLE, ROLE_BINDING_SUBJECT, add_dependency,
};
use crate::graph::{
    ExtractError, ExtractResult, LabelSelector, Node, Relationship, RelationshipMap, nested_str,
};

/// ClusterRole relationships: the cluster roles whose rules are aggregated
pub fn cluster_role_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();
    let path = ["aggregationRule", "clusterRoleSelectors"];

    let selectors: Vec<MetaLabelSelector> = node.parse_field(&path)?.unwrap_or_default();
    for selector in selectors {
        // An empty selector would aggregate every cluster role
        let has_terms = selector.match_labels.as_ref().is_some_and(|m| !m.is_empty())
            || selector.match_expressions.as_ref().is_some_and(|e| !e.is_empty());
        if !has_terms {
            continue;
        }
        let selector = Selector::try_from(selector).map_err(|e| ExtractError::InvalidSelector {
            field: path.join("."),
            message: e.to_string(),
        })?;
        rmap.add_dependency_by_label_selector(
            LabelSelector::new(RBAC_GROUP, "ClusterRole", "", selector),
            CLUSTER_ROLE_AGGREGATION_RULE,
        );
    }

    Ok(rmap)
}

/// ClusterRoleBinding relationships: bound cluster role and service accounts
pub fn cluster_role_binding_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();

    add_role_ref(&mut rmap, node, "", CLUSTER_ROLE_BINDING_ROLE)?;
    add_subjects(&mut rmap, node, CLUSTER_ROLE_BINDING_SUBJECT);

    Ok(rmap)
}

/// RoleBinding relationships: bound role or cluster role and service accounts
pub fn role_binding_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();

    add_role_ref(&mut rmap, node, &node.namespace, ROLE_BINDING_ROLE)?;
    add_subjects(&mut rmap, node, ROLE_BINDING_SUBJECT);

    Ok(rmap)
}

/// `roleRef` is required on bindings; a Role is always in the binding namespace
fn add_role_ref(
    rmap: &mut RelationshipMap,
    node: &Node<'_>,
    namespace: &str,
    r: Relationship,
) -> Result<(), ExtractError> {
    let kind = node.nested_string(&["roleRef", "kind"]);
    if kind.is_empty() {
        return Err(ExtractError::MissingField("roleRef.kind".to_string()));
    }
    let namespace = if kind == "ClusterRole" { "" } else { namespace };
    add_dependency(rmap, RBAC_GROUP, &kind, namespace, &node.nested_string(&["roleRef", "name"]), r);
    Ok(())
}

/// Service account subjects; users and groups are not API objects
fn add_subjects(rmap: &mut RelationshipMap, node: &Node<'_>, r: Relationship) {
    for subject in node.nested_array(&["subjects"]) {
        if nested_str(subject, &["kind"]) != "ServiceAccount" {
            continue;
        }
        let namespace = match nested_str(subject, &["namespace"]) {
            "" => node.namespace.as_str(),
            ns => ns,
        };
        add_dependency(
            rmap,
            "",
            "ServiceAccount",
            namespace,
            nested_str(subject, &["name"]),
            r.clone(),
        );
    }
}
