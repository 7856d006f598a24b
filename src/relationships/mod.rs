//! Built-in relationship extractors for Kubernetes resource kinds
//!
//! Each extractor reads the fields of one object and declares which other
//! objects it depends on. Extractors are plain functions registered in an
//! [`ExtractorRegistry`]; see [`default_registry`] for the full set.
//!
//! To support a new kind:
//! 1. Add a `fn(&Node) -> ExtractResult` in the module for its API group
//! 2. Add its relationship tags below
//! 3. Register it in `default_registry()`

mod admission;
mod core_group;
mod networking;
mod rbac;

use crate::graph::{ExtractorRegistry, Reference, Relationship, RelationshipMap};

pub use admission::{
    mutating_webhook_configuration_relationships, validating_webhook_configuration_relationships,
};
pub use core_group::{
    event_relationships, persistent_volume_claim_relationships, persistent_volume_relationships,
    pod_relationships, service_account_relationships, service_relationships,
};
pub use networking::{ingress_class_relationships, ingress_relationships};
pub use rbac::{
    cluster_role_binding_relationships, cluster_role_relationships, role_binding_relationships,
};

pub const ADMISSION_GROUP: &str = "admissionregistration.k8s.io";
pub const EVENTS_GROUP: &str = "events.k8s.io";
pub const EXTENSIONS_GROUP: &str = "extensions";
pub const NETWORKING_GROUP: &str = "networking.k8s.io";
pub const RBAC_GROUP: &str = "rbac.authorization.k8s.io";
pub const STORAGE_GROUP: &str = "storage.k8s.io";

// ClusterRole
pub const CLUSTER_ROLE_AGGREGATION_RULE: Relationship =
    Relationship::from_static("ClusterRoleAggregationRule");

// ClusterRoleBinding
pub const CLUSTER_ROLE_BINDING_ROLE: Relationship =
    Relationship::from_static("ClusterRoleBindingRole");
pub const CLUSTER_ROLE_BINDING_SUBJECT: Relationship =
    Relationship::from_static("ClusterRoleBindingSubject");

// Event
pub const EVENT_REGARDING: Relationship = Relationship::from_static("EventRegarding");
pub const EVENT_RELATED: Relationship = Relationship::from_static("EventRelated");

// Ingress
pub const INGRESS_CLASS: Relationship = Relationship::from_static("IngressClass");
pub const INGRESS_RESOURCE: Relationship = Relationship::from_static("IngressResource");
pub const INGRESS_SERVICE: Relationship = Relationship::from_static("IngressService");
pub const INGRESS_TLS_SECRET: Relationship = Relationship::from_static("IngressTLSSecret");

// IngressClass
pub const INGRESS_CLASS_PARAMETERS: Relationship =
    Relationship::from_static("IngressClassParameters");

// PersistentVolume
pub const PERSISTENT_VOLUME_CSI_DRIVER: Relationship =
    Relationship::from_static("PersistentVolumeCSIDriver");
pub const PERSISTENT_VOLUME_STORAGE_CLASS: Relationship =
    Relationship::from_static("PersistentVolumeStorageClass");

// PersistentVolumeClaim
pub const PERSISTENT_VOLUME_CLAIM: Relationship =
    Relationship::from_static("PersistentVolumeClaim");
pub const PERSISTENT_VOLUME_CLAIM_STORAGE_CLASS: Relationship =
    Relationship::from_static("PersistentVolumeClaimStorageClass");

// Pod
pub const POD_CONTAINER_ENV: Relationship = Relationship::from_static("PodContainerEnv");
pub const POD_IMAGE_PULL_SECRET: Relationship = Relationship::from_static("PodImagePullSecret");
pub const POD_NODE: Relationship = Relationship::from_static("PodNode");
pub const POD_PRIORITY_CLASS: Relationship = Relationship::from_static("PodPriorityClass");
pub const POD_RUNTIME_CLASS: Relationship = Relationship::from_static("PodRuntimeClass");
pub const POD_SERVICE_ACCOUNT: Relationship = Relationship::from_static("PodServiceAccount");
pub const POD_VOLUME: Relationship = Relationship::from_static("PodVolume");

// RoleBinding
pub const ROLE_BINDING_ROLE: Relationship = Relationship::from_static("RoleBindingRole");
pub const ROLE_BINDING_SUBJECT: Relationship = Relationship::from_static("RoleBindingSubject");

// Service
pub const SERVICE: Relationship = Relationship::from_static("Service");

// ServiceAccount
pub const SERVICE_ACCOUNT_IMAGE_PULL_SECRET: Relationship =
    Relationship::from_static("ServiceAccountImagePullSecret");
pub const SERVICE_ACCOUNT_SECRET: Relationship = Relationship::from_static("ServiceAccountSecret");

// Mutating/ValidatingWebhookConfiguration
pub const WEBHOOK_CONFIGURATION_SERVICE: Relationship =
    Relationship::from_static("WebhookConfigurationService");

/// Registry with an extractor for every supported kind
pub fn default_registry() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    registry
        .register("", "PersistentVolume", persistent_volume_relationships)
        .register("", "PersistentVolumeClaim", persistent_volume_claim_relationships)
        .register("", "Pod", pod_relationships)
        .register("", "Service", service_relationships)
        .register("", "ServiceAccount", service_account_relationships)
        .register("", "Event", event_relationships)
        .register(EVENTS_GROUP, "Event", event_relationships)
        .register(
            ADMISSION_GROUP,
            "MutatingWebhookConfiguration",
            mutating_webhook_configuration_relationships,
        )
        .register(
            ADMISSION_GROUP,
            "ValidatingWebhookConfiguration",
            validating_webhook_configuration_relationships,
        )
        .register(NETWORKING_GROUP, "Ingress", ingress_relationships)
        .register(EXTENSIONS_GROUP, "Ingress", ingress_relationships)
        .register(NETWORKING_GROUP, "IngressClass", ingress_class_relationships)
        .register(RBAC_GROUP, "ClusterRole", cluster_role_relationships)
        .register(RBAC_GROUP, "ClusterRoleBinding", cluster_role_binding_relationships)
        .register(RBAC_GROUP, "RoleBinding", role_binding_relationships);
    registry
}

/// Declare a dependency on a named object, ignoring empty names
fn add_dependency(
    rmap: &mut RelationshipMap,
    group: &str,
    kind: &str,
    namespace: &str,
    name: &str,
    r: Relationship,
) {
    if name.is_empty() {
        return;
    }
    rmap.add_dependency_by_ref(&Reference::new(group, kind, namespace, name), r);
}
