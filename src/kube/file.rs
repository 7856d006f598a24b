//! Object loading from manifest files

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kube::core::DynamicObject;
use serde::Deserialize;
use serde_json::Value;

use super::{ObjectSource, SourceError, SourceResult};
use crate::graph::{Reference, group_of};

/// Snapshot read from YAML or JSON manifests
///
/// Files may hold several YAML documents and `kind: List` documents, as
/// produced by `kubectl get -o yaml`. Objects without a uid (hand-written
/// manifests) get one derived from their reference, so they can still take
/// part in selector and reference relationships.
#[derive(Debug, Clone)]
pub struct FileSource {
    paths: Vec<PathBuf>,
    namespace: String,
}

impl FileSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            namespace: "default".to_string(),
        }
    }

    pub fn namespace(mut self, namespace: Option<String>) -> Self {
        if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
            self.namespace = ns;
        }
        self
    }

    /// Parse all objects of one file
    pub fn load_file(path: &Path) -> SourceResult<Vec<DynamicObject>> {
        let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> SourceResult<Vec<DynamicObject>> {
        let mut objects = Vec::new();

        for document in serde_yaml::Deserializer::from_str(contents) {
            let value = Value::deserialize(document).map_err(|source| SourceError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
            // Empty documents between separators
            if value.is_null() {
                continue;
            }

            for item in flatten_list(value) {
                let mut obj: DynamicObject =
                    serde_json::from_value(item).map_err(|source| SourceError::Object {
                        path: path.to_path_buf(),
                        source,
                    })?;
                ensure_uid(&mut obj);
                objects.push(obj);
            }
        }

        tracing::debug!("Loaded {} objects from {}", objects.len(), path.display());
        Ok(objects)
    }
}

#[async_trait]
impl ObjectSource for FileSource {
    async fn fetch(&self) -> SourceResult<Vec<DynamicObject>> {
        let mut objects = Vec::new();
        for path in &self.paths {
            objects.extend(Self::load_file(path)?);
        }
        Ok(objects)
    }

    fn default_namespace(&self) -> &str {
        &self.namespace
    }
}

/// Items of a `List` document, or the document itself
fn flatten_list(value: Value) -> Vec<Value> {
    let is_list = value
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.ends_with("List"))
        && value.pointer("/metadata/name").is_none()
        && value.get("items").is_some_and(Value::is_array);

    match value {
        Value::Object(mut map) if is_list => match map.remove("items") {
            Some(Value::Array(items)) => items.into_iter().flat_map(flatten_list).collect(),
            _ => Vec::new(),
        },
        other => vec![other],
    }
}

fn ensure_uid(obj: &mut DynamicObject) {
    if obj.metadata.uid.as_deref().is_some_and(|uid| !uid.is_empty()) {
        return;
    }
    let (group, kind) = match &obj.types {
        Some(types) => (group_of(&types.api_version), types.kind.as_str()),
        None => ("", ""),
    };
    let reference = Reference::new(
        group,
        kind,
        obj.metadata.namespace.clone().unwrap_or_default(),
        obj.metadata.name.clone().unwrap_or_default(),
    );
    obj.metadata.uid = Some(reference.key().to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multi_document_yaml() {
        let contents = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
  namespace: shop
  uid: cm-1
---
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: shop
"#;
        let objects = FileSource::parse(Path::new("manifests.yaml"), contents).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].metadata.uid.as_deref(), Some("cm-1"));
        assert_eq!(objects[1].metadata.uid.as_deref(), Some("apps\\Deployment\\shop\\web"));
    }

    #[test]
    fn test_parse_list_document() {
        let contents = r#"{
            "apiVersion": "v1",
            "kind": "List",
            "items": [
                {"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "a", "namespace": "default", "uid": "p-a"}},
                {"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "b", "namespace": "default", "uid": "p-b"}}
            ]
        }"#;
        let objects = FileSource::parse(Path::new("pods.json"), contents).unwrap();
        let names: Vec<_> = objects.iter().filter_map(|o| o.metadata.name.as_deref()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_typed_list_document() {
        let contents = r#"
apiVersion: v1
kind: PodList
items:
- apiVersion: v1
  kind: Pod
  metadata: {name: a, namespace: default, uid: p-a}
"#;
        let objects = FileSource::parse(Path::new("pods.yaml"), contents).unwrap();
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let err = FileSource::parse(Path::new("broken.yaml"), "kind: [unterminated").unwrap_err();
        assert!(matches!(err, SourceError::Yaml { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_missing_file() {
        let err = FileSource::load_file(Path::new("/nonexistent/kube-lineage.yaml")).unwrap_err();
        assert!(matches!(err, SourceError::Read { .. }));
    }
}
