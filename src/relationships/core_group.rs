//! Extractors for core API group kinds (Pod, Service, Event, volumes, ...)

use std::collections::BTreeMap;

use serde_json::Value;

use super::{
    EVENT_REGARDING, EVENT_RELATED, PERSISTENT_VOLUME_CLAIM,
    PERSISTENT_VOLUME_CLAIM_STORAGE_CLASS, PERSISTENT_VOLUME_CSI_DRIVER,
    PERSISTENT_VOLUME_STORAGE_CLASS, POD_CONTAINER_ENV, POD_IMAGE_PULL_SECRET, POD_NODE,
    POD_PRIORITY_CLASS, POD_RUNTIME_CLASS, POD_SERVICE_ACCOUNT, POD_VOLUME, SERVICE,
    SERVICE_ACCOUNT_IMAGE_PULL_SECRET, SERVICE_ACCOUNT_SECRET, STORAGE_GROUP, add_dependency,
};
use crate::graph::{
    ExtractResult, LabelSelector, Node, Reference, Relationship, RelationshipMap, group_of,
    nested_slice, nested_str, nested_value,
};

/// Pod relationships: node, service account, scheduling classes, secrets,
/// config maps and claims referenced by volumes or container environment
pub fn pod_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();
    let ns = node.namespace.as_str();

    add_dependency(&mut rmap, "", "Node", "", &node.nested_string(&["spec", "nodeName"]), POD_NODE);
    add_dependency(
        &mut rmap,
        "",
        "ServiceAccount",
        ns,
        &node.nested_string(&["spec", "serviceAccountName"]),
        POD_SERVICE_ACCOUNT,
    );
    add_dependency(
        &mut rmap,
        "scheduling.k8s.io",
        "PriorityClass",
        "",
        &node.nested_string(&["spec", "priorityClassName"]),
        POD_PRIORITY_CLASS,
    );
    add_dependency(
        &mut rmap,
        "node.k8s.io",
        "RuntimeClass",
        "",
        &node.nested_string(&["spec", "runtimeClassName"]),
        POD_RUNTIME_CLASS,
    );

    for secret in node.nested_array(&["spec", "imagePullSecrets"]) {
        add_dependency(&mut rmap, "", "Secret", ns, nested_str(secret, &["name"]), POD_IMAGE_PULL_SECRET);
    }

    for volume in node.nested_array(&["spec", "volumes"]) {
        add_dependency(&mut rmap, "", "ConfigMap", ns, nested_str(volume, &["configMap", "name"]), POD_VOLUME);
        add_dependency(&mut rmap, "", "Secret", ns, nested_str(volume, &["secret", "secretName"]), POD_VOLUME);
        add_dependency(
            &mut rmap,
            "",
            "PersistentVolumeClaim",
            ns,
            nested_str(volume, &["persistentVolumeClaim", "claimName"]),
            POD_VOLUME,
        );
        for source in nested_slice(volume, &["projected", "sources"]) {
            add_dependency(&mut rmap, "", "ConfigMap", ns, nested_str(source, &["configMap", "name"]), POD_VOLUME);
            add_dependency(&mut rmap, "", "Secret", ns, nested_str(source, &["secret", "name"]), POD_VOLUME);
        }
    }

    let containers = ["containers", "initContainers", "ephemeralContainers"]
        .into_iter()
        .flat_map(|field| node.nested_array(&["spec", field]));
    for container in containers {
        for env in nested_slice(container, &["env"]) {
            add_dependency(
                &mut rmap,
                "",
                "ConfigMap",
                ns,
                nested_str(env, &["valueFrom", "configMapKeyRef", "name"]),
                POD_CONTAINER_ENV,
            );
            add_dependency(
                &mut rmap,
                "",
                "Secret",
                ns,
                nested_str(env, &["valueFrom", "secretKeyRef", "name"]),
                POD_CONTAINER_ENV,
            );
        }
        for env_from in nested_slice(container, &["envFrom"]) {
            add_dependency(&mut rmap, "", "ConfigMap", ns, nested_str(env_from, &["configMapRef", "name"]), POD_CONTAINER_ENV);
            add_dependency(&mut rmap, "", "Secret", ns, nested_str(env_from, &["secretRef", "name"]), POD_CONTAINER_ENV);
        }
    }

    Ok(rmap)
}

/// Service relationships: pods matched by the service selector
pub fn service_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();

    // Services without a selector (e.g. ExternalName) have manually managed endpoints
    let selector: Option<BTreeMap<String, String>> = node.parse_field(&["spec", "selector"])?;
    if let Some(labels) = selector.filter(|labels| !labels.is_empty()) {
        let pods = LabelSelector::new("", "Pod", &node.namespace, labels.into_iter().collect());
        rmap.add_dependency_by_label_selector(pods, SERVICE);
    }

    Ok(rmap)
}

/// ServiceAccount relationships: mountable and image pull secrets
pub fn service_account_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();
    let ns = node.namespace.as_str();

    for secret in node.nested_array(&["secrets"]) {
        add_dependency(&mut rmap, "", "Secret", ns, nested_str(secret, &["name"]), SERVICE_ACCOUNT_SECRET);
    }
    for secret in node.nested_array(&["imagePullSecrets"]) {
        add_dependency(
            &mut rmap,
            "",
            "Secret",
            ns,
            nested_str(secret, &["name"]),
            SERVICE_ACCOUNT_IMAGE_PULL_SECRET,
        );
    }

    Ok(rmap)
}

/// PersistentVolumeClaim relationships: bound volume and storage class
pub fn persistent_volume_claim_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();

    add_dependency(
        &mut rmap,
        "",
        "PersistentVolume",
        "",
        &node.nested_string(&["spec", "volumeName"]),
        PERSISTENT_VOLUME_CLAIM,
    );
    add_dependency(
        &mut rmap,
        STORAGE_GROUP,
        "StorageClass",
        "",
        &node.nested_string(&["spec", "storageClassName"]),
        PERSISTENT_VOLUME_CLAIM_STORAGE_CLASS,
    );

    Ok(rmap)
}

/// PersistentVolume relationships: storage class and CSI driver
pub fn persistent_volume_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();

    add_dependency(
        &mut rmap,
        STORAGE_GROUP,
        "StorageClass",
        "",
        &node.nested_string(&["spec", "storageClassName"]),
        PERSISTENT_VOLUME_STORAGE_CLASS,
    );
    add_dependency(
        &mut rmap,
        STORAGE_GROUP,
        "CSIDriver",
        "",
        &node.nested_string(&["spec", "csi", "driver"]),
        PERSISTENT_VOLUME_CSI_DRIVER,
    );

    Ok(rmap)
}

/// Event relationships: the object the event is about and a related object
///
/// Handles both `v1` events (`involvedObject`) and `events.k8s.io` events
/// (`regarding`).
pub fn event_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();

    let regarding = node.field(&["regarding"]).or_else(|| node.field(&["involvedObject"]));
    if let Some(target) = regarding {
        add_event_target(&mut rmap, target, EVENT_REGARDING);
    }
    if let Some(target) = node.field(&["related"]) {
        add_event_target(&mut rmap, target, EVENT_RELATED);
    }

    Ok(rmap)
}

/// Address an event's object reference by uid when set, otherwise by name
///
/// Node events use the node name or hostname as uid; those resolve through
/// the host aliases of the index.
fn add_event_target(rmap: &mut RelationshipMap, target: &Value, r: Relationship) {
    let uid = nested_str(target, &["uid"]);
    if !uid.is_empty() {
        rmap.add_dependency_by_uid(uid, r);
        return;
    }

    let kind = nested_str(target, &["kind"]);
    let name = nested_str(target, &["name"]);
    if kind.is_empty() || name.is_empty() {
        return;
    }
    let group = nested_value(target, &["apiVersion"])
        .and_then(Value::as_str)
        .map(group_of)
        .unwrap_or("");
    let reference = Reference::new(group, kind, nested_str(target, &["namespace"]), name);
    rmap.add_dependency_by_ref(&reference, r);
}
