//! Extractors for networking.k8s.io and extensions kinds

use serde_json::Value;

use super::{
    INGRESS_CLASS, INGRESS_CLASS_PARAMETERS, INGRESS_RESOURCE, INGRESS_SERVICE,
    INGRESS_TLS_SECRET, NETWORKING_GROUP, add_dependency,
};
use crate::graph::{ExtractResult, Node, RelationshipMap, nested_slice, nested_str};

/// Ingress relationships: ingress class, backends and TLS secrets
///
/// Understands both the `networking.k8s.io/v1` backend layout
/// (`service.name`, `resource`) and the older `serviceName` layout.
pub fn ingress_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();
    let ns = node.namespace.as_str();

    add_dependency(
        &mut rmap,
        NETWORKING_GROUP,
        "IngressClass",
        "",
        &node.nested_string(&["spec", "ingressClassName"]),
        INGRESS_CLASS,
    );

    let default_backend = node
        .field(&["spec", "defaultBackend"])
        .or_else(|| node.field(&["spec", "backend"]));
    let rule_backends = node
        .nested_array(&["spec", "rules"])
        .iter()
        .flat_map(|rule| nested_slice(rule, &["http", "paths"]))
        .filter_map(|path| path.get("backend"));
    for backend in default_backend.into_iter().chain(rule_backends) {
        add_backend(&mut rmap, ns, backend);
    }

    for tls in node.nested_array(&["spec", "tls"]) {
        add_dependency(&mut rmap, "", "Secret", ns, nested_str(tls, &["secretName"]), INGRESS_TLS_SECRET);
    }

    Ok(rmap)
}

fn add_backend(rmap: &mut RelationshipMap, namespace: &str, backend: &Value) {
    let service = match nested_str(backend, &["service", "name"]) {
        "" => nested_str(backend, &["serviceName"]),
        name => name,
    };
    add_dependency(rmap, "", "Service", namespace, service, INGRESS_SERVICE);

    if let Some(resource) = backend.get("resource") {
        add_dependency(
            rmap,
            nested_str(resource, &["apiGroup"]),
            nested_str(resource, &["kind"]),
            namespace,
            nested_str(resource, &["name"]),
            INGRESS_RESOURCE,
        );
    }
}

/// IngressClass relationships: the controller parameters object
pub fn ingress_class_relationships(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();

    if let Some(parameters) = node.field(&["spec", "parameters"]) {
        let namespace = match nested_str(parameters, &["scope"]) {
            "Namespace" => nested_str(parameters, &["namespace"]),
            _ => "",
        };
        add_dependency(
            &mut rmap,
            nested_str(parameters, &["apiGroup"]),
            nested_str(parameters, &["kind"]),
            namespace,
            nested_str(parameters, &["name"]),
            INGRESS_CLASS_PARAMETERS,
        );
    }

    Ok(rmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Reference;
    use crate::relationships::test_support::object;
    use serde_json::json;

    #[test]
    fn test_ingress_v1() {
        let obj = object(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {"name": "web", "namespace": "shop", "uid": "ing-1"},
            "spec": {
                "ingressClassName": "nginx",
                "defaultBackend": {"service": {"name": "fallback", "port": {"number": 80}}},
                "rules": [{
                    "host": "shop.example.com",
                    "http": {"paths": [
                        {"path": "/", "pathType": "Prefix", "backend": {"service": {"name": "web", "port": {"number": 80}}}},
                        {"path": "/static", "pathType": "Prefix", "backend": {"resource": {"apiGroup": "k8s.example.com", "kind": "StorageBucket", "name": "assets"}}}
                    ]}
                }],
                "tls": [{"hosts": ["shop.example.com"], "secretName": "shop-tls"}]
            }
        }));
        let rmap = ingress_relationships(&Node::new(&obj)).unwrap();

        let has = |group: &str, kind: &str, ns: &str, name: &str, tag: &str| {
            rmap.dependencies_by_ref
                .get(&Reference::new(group, kind, ns, name).key())
                .is_some_and(|rset| rset.contains(tag))
        };
        assert!(has(NETWORKING_GROUP, "IngressClass", "", "nginx", "IngressClass"));
        assert!(has("", "Service", "shop", "fallback", "IngressService"));
        assert!(has("", "Service", "shop", "web", "IngressService"));
        assert!(has("k8s.example.com", "StorageBucket", "shop", "assets", "IngressResource"));
        assert!(has("", "Secret", "shop", "shop-tls", "IngressTLSSecret"));
        assert_eq!(rmap.dependencies_by_ref.len(), 5);
    }

    #[test]
    fn test_ingress_extensions_backend() {
        let obj = object(json!({
            "apiVersion": "extensions/v1beta1",
            "kind": "Ingress",
            "metadata": {"name": "legacy", "namespace": "shop", "uid": "ing-2"},
            "spec": {
                "backend": {"serviceName": "legacy", "servicePort": 80},
                "rules": [{"http": {"paths": [{"backend": {"serviceName": "api", "servicePort": 8080}}]}}]
            }
        }));
        let rmap = ingress_relationships(&Node::new(&obj)).unwrap();
        assert!(rmap.dependencies_by_ref.contains_key(&Reference::new("", "Service", "shop", "legacy").key()));
        assert!(rmap.dependencies_by_ref.contains_key(&Reference::new("", "Service", "shop", "api").key()));
    }

    #[test]
    fn test_ingress_class_parameters() {
        let cluster_scoped = object(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "IngressClass",
            "metadata": {"name": "external-lb", "uid": "ic-1"},
            "spec": {
                "controller": "example.com/ingress-controller",
                "parameters": {"apiGroup": "k8s.example.com", "kind": "IngressParameters", "name": "external-lb"}
            }
        }));
        let rmap = ingress_class_relationships(&Node::new(&cluster_scoped)).unwrap();
        let params = Reference::new("k8s.example.com", "IngressParameters", "", "external-lb").key();
        assert!(rmap.dependencies_by_ref[&params].contains("IngressClassParameters"));

        let namespaced = object(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "IngressClass",
            "metadata": {"name": "internal", "uid": "ic-2"},
            "spec": {
                "controller": "example.com/ingress-controller",
                "parameters": {
                    "apiGroup": "k8s.example.com",
                    "kind": "IngressParameters",
                    "name": "internal",
                    "namespace": "ingress",
                    "scope": "Namespace"
                }
            }
        }));
        let rmap = ingress_class_relationships(&Node::new(&namespaced)).unwrap();
        let params = Reference::new("k8s.example.com", "IngressParameters", "ingress", "internal").key();
        assert!(rmap.dependencies_by_ref.contains_key(&params));
    }

    #[test]
    fn test_ingress_class_without_parameters() {
        let obj = object(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "IngressClass",
            "metadata": {"name": "nginx", "uid": "ic-1"},
            "spec": {"controller": "k8s.io/ingress-nginx"}
        }));
        assert!(ingress_class_relationships(&Node::new(&obj)).unwrap().is_empty());
    }
}
