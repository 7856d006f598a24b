//! Graph nodes wrapping borrowed Kubernetes objects

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::core::DynamicObject;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::models::{Reference, ReferenceKey, Relationship, RelationshipSet, Uid};
use super::registry::ExtractError;

static NO_LABELS: BTreeMap<String, String> = BTreeMap::new();

/// A Kubernetes object in the relationship graph
///
/// The object itself is borrowed from the input collection and never modified.
/// Edges to other nodes are stored by UID in `dependents`.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    pub object: &'a DynamicObject,
    pub uid: Uid,
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub owner_references: &'a [OwnerReference],
    pub dependents: BTreeMap<Uid, RelationshipSet>,
}

impl<'a> Node<'a> {
    pub fn new(object: &'a DynamicObject) -> Self {
        let (group, kind) = match &object.types {
            Some(types) => (group_of(&types.api_version).to_string(), types.kind.clone()),
            None => (String::new(), String::new()),
        };
        let meta = &object.metadata;

        Self {
            object,
            uid: meta.uid.clone().unwrap_or_default(),
            group,
            kind,
            namespace: meta.namespace.clone().unwrap_or_default(),
            name: meta.name.clone().unwrap_or_default(),
            owner_references: meta.owner_references.as_deref().unwrap_or_default(),
            dependents: BTreeMap::new(),
        }
    }

    /// Record `uid` as a dependent of this node
    pub fn add_dependent(&mut self, uid: &str, r: Relationship) {
        self.dependents.entry(uid.to_string()).or_default().insert(r);
    }

    pub fn labels(&self) -> &'a BTreeMap<String, String> {
        self.object.metadata.labels.as_ref().unwrap_or(&NO_LABELS)
    }

    pub fn reference(&self) -> Reference {
        Reference::new(&self.group, &self.kind, &self.namespace, &self.name)
    }

    pub fn reference_key(&self) -> ReferenceKey {
        self.reference().key()
    }

    /// Look up a nested field of the object body
    pub fn field(&self, path: &[&str]) -> Option<&'a Value> {
        nested_value(&self.object.data, path)
    }

    /// Nested string field, or an empty string when missing or not a string
    pub fn nested_string(&self, path: &[&str]) -> String {
        nested_str(&self.object.data, path).to_string()
    }

    /// Nested array field, or an empty slice when missing or not an array
    pub fn nested_array(&self, path: &[&str]) -> &'a [Value] {
        nested_slice(&self.object.data, path)
    }

    /// Deserialize a nested field into a typed value
    ///
    /// Returns `Ok(None)` when the field is absent or null.
    pub fn parse_field<T: DeserializeOwned>(&self, path: &[&str]) -> Result<Option<T>, ExtractError> {
        match self.field(path) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|source| ExtractError::InvalidField {
                    field: path.join("."),
                    source,
                }),
        }
    }
}

/// API group of an `apiVersion` string (`apps/v1` -> `apps`, `v1` -> ``)
pub fn group_of(api_version: &str) -> &str {
    api_version
        .split_once('/')
        .map(|(group, _)| group)
        .unwrap_or("")
}

/// Walk `path` through nested JSON objects
pub fn nested_value<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, segment| current.get(*segment))
}

/// Nested string lookup with an empty-string fallback
pub fn nested_str<'v>(value: &'v Value, path: &[&str]) -> &'v str {
    nested_value(value, path)
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Nested array lookup with an empty-slice fallback
pub fn nested_slice<'v>(value: &'v Value, path: &[&str]) -> &'v [Value] {
    nested_value(value, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Ordered map of nodes keyed by UID
///
/// Holds either a resolved subgraph or the nodes of a whole cluster snapshot.
pub type NodeMap<'a> = BTreeMap<Uid, Node<'a>>;
