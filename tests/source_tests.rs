//! Tests for object sources and root lookup

use std::io::Write;

use async_trait::async_trait;
use kube::core::DynamicObject;
use kube_lineage::cli::{Lineage, LineageError, QueryError, ResourceQuery};
use kube_lineage::kube::{FileSource, ObjectSource, SourceError, SourceResult};
use kube_lineage::relationships::default_registry;
use mockall::mock;
use serde_json::json;

mock! {
    pub Source {}

    #[async_trait]
    impl ObjectSource for Source {
        async fn fetch(&self) -> SourceResult<Vec<DynamicObject>>;
        fn default_namespace(&self) -> &str;
    }
}

fn workload() -> Vec<DynamicObject> {
    [
        json!({
            "apiVersion": "apps/v1",
            "kind": "StatefulSet",
            "metadata": {"name": "db", "namespace": "data", "uid": "sts-1"}
        }),
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "db-0", "namespace": "data", "uid": "pod-1",
                "ownerReferences": [{"apiVersion": "apps/v1", "kind": "StatefulSet", "name": "db", "uid": "sts-1", "controller": true}]
            }
        }),
    ]
    .into_iter()
    .map(|v| serde_json::from_value(v).unwrap())
    .collect()
}

#[tokio::test]
async fn test_lineage_from_mock_source() {
    let mut source = MockSource::new();
    source.expect_fetch().times(1).returning(|| Ok(workload()));
    source.expect_default_namespace().return_const("data".to_string());

    let query = ResourceQuery::parse("sts", Some("db")).unwrap();
    let lineage = Lineage::load(&source, &query, None).await.unwrap();

    assert_eq!(lineage.root_uid(), "sts-1");
    assert_eq!(lineage.objects().len(), 2);
    let nodes = lineage.dependents(&default_registry());
    assert_eq!(nodes.keys().collect::<Vec<_>>(), vec!["pod-1", "sts-1"]);
}

#[tokio::test]
async fn test_lineage_explicit_namespace_wins() {
    let mut source = MockSource::new();
    source.expect_fetch().returning(|| Ok(workload()));
    source.expect_default_namespace().never();

    let query = ResourceQuery::parse("pod/db-0", None).unwrap();
    let err = Lineage::load(&source, &query, Some("other")).await.unwrap_err();
    assert!(matches!(err, LineageError::Query(QueryError::NotFound { .. })));
}

#[tokio::test]
async fn test_lineage_propagates_source_errors() {
    let mut source = MockSource::new();
    source.expect_fetch().returning(|| {
        Err(SourceError::Read {
            path: "cluster.yaml".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        })
    });

    let query = ResourceQuery::parse("sts/db", None).unwrap();
    let err = Lineage::load(&source, &query, Some("data")).await.unwrap_err();
    assert!(matches!(err, LineageError::Source(SourceError::Read { .. })));
}

#[tokio::test]
async fn test_file_source_reads_manifests() {
    let mut manifests = tempfile::NamedTempFile::new().unwrap();
    write!(
        manifests,
        r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
  namespace: data
---
apiVersion: v1
kind: Pod
metadata:
  name: reader
  namespace: data
  uid: pod-9
spec:
  containers:
  - name: app
    image: app:1.0
    envFrom:
    - configMapRef:
        name: settings
"#
    )
    .unwrap();

    let source = FileSource::new(vec![manifests.path().to_path_buf()]).namespace(Some("data".to_string()));
    assert_eq!(source.default_namespace(), "data");

    let query = ResourceQuery::parse("cm", Some("settings")).unwrap();
    let lineage = Lineage::load(&source, &query, None).await.unwrap();

    // Hand-written manifests get a uid derived from their reference
    assert_eq!(lineage.root_uid(), "\\ConfigMap\\data\\settings");
    let nodes = lineage.dependents(&default_registry());
    assert!(nodes[lineage.root_uid()].dependents["pod-9"].contains("PodContainerEnv"));
}

#[tokio::test]
async fn test_file_source_missing_file() {
    let source = FileSource::new(vec!["/nonexistent/manifests.yaml".into()]);
    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, SourceError::Read { .. }));
}
