//! Extractors for admissionregistration.k8s.io kinds

use super::{WEBHOOK_CONFIGURATION_SERVICE, add_dependency};
use crate::graph::{ExtractResult, Node, RelationshipMap, nested_str};

pub fn mutating_webhook_configuration_relationships(node: &Node<'_>) -> ExtractResult {
    webhook_services(node)
}

pub fn validating_webhook_configuration_relationships(node: &Node<'_>) -> ExtractResult {
    webhook_services(node)
}

/// Services backing the webhooks; URL-configured webhooks have none
fn webhook_services(node: &Node<'_>) -> ExtractResult {
    let mut rmap = RelationshipMap::new();

    for webhook in node.nested_array(&["webhooks"]) {
        add_dependency(
            &mut rmap,
            "",
            "Service",
            nested_str(webhook, &["clientConfig", "service", "namespace"]),
            nested_str(webhook, &["clientConfig", "service", "name"]),
            WEBHOOK_CONFIGURATION_SERVICE,
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
    fn test_webhook_services() {
        let obj = object(json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": "ValidatingWebhookConfiguration",
            "metadata": {"name": "policy", "uid": "vwc-1"},
            "webhooks": [
                {
                    "name": "validate.policy.example.com",
                    "clientConfig": {"service": {"name": "policy-webhook", "namespace": "policy", "path": "/validate"}}
                },
                {
                    "name": "external.example.com",
                    "clientConfig": {"url": "https://hooks.example.com/validate"}
                }
            ]
        }));
        let rmap = validating_webhook_configuration_relationships(&Node::new(&obj)).unwrap();

        assert_eq!(rmap.dependencies_by_ref.len(), 1);
        let service = Reference::new("", "Service", "policy", "policy-webhook").key();
        assert!(rmap.dependencies_by_ref[&service].contains("WebhookConfigurationService"));
    }

    #[test]
    fn test_mutating_webhook_without_webhooks() {
        let obj = object(json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": "MutatingWebhookConfiguration",
            "metadata": {"name": "empty", "uid": "mwc-1"}
        }));
        assert!(mutating_webhook_configuration_relationships(&Node::new(&obj)).unwrap().is_empty());
    }
}
