//! Object fetching from a live cluster
//!
//! Discovers every listable resource type the API server serves and lists
//! them all, a bounded number of types at a time.

use async_trait::async_trait;
use futures::{StreamExt, stream};
use kube::api::{Api, ListParams};
use kube::core::{DynamicObject, TypeMeta};
use kube::discovery::{ApiCapabilities, ApiResource, Discovery, Scope, verbs};
use kube::Client;

use super::{ObjectSource, SourceResult};

/// Resource types listed concurrently unless configured otherwise
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Page size for list requests
const PAGE_SIZE: u32 = 500;

/// Snapshot of a cluster through the Kubernetes API
pub struct ClusterSource {
    client: Client,
    namespace: Option<String>,
    concurrency: usize,
    excluded_groups: Vec<String>,
}

impl ClusterSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            namespace: None,
            concurrency: DEFAULT_CONCURRENCY,
            excluded_groups: Vec::new(),
        }
    }

    /// Restrict namespaced resources to one namespace
    ///
    /// Cluster-scoped resources are always listed.
    pub fn namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Skip whole API groups, e.g. `metrics.k8s.io`
    pub fn exclude_groups(mut self, groups: Vec<String>) -> Self {
        self.excluded_groups = groups;
        self
    }

    fn api(&self, ar: &ApiResource, caps: &ApiCapabilities) -> Api<DynamicObject> {
        match (&caps.scope, &self.namespace) {
            (Scope::Namespaced, Some(ns)) => Api::namespaced_with(self.client.clone(), ns, ar),
            _ => Api::all_with(self.client.clone(), ar),
        }
    }
}

#[async_trait]
impl ObjectSource for ClusterSource {
    async fn fetch(&self) -> SourceResult<Vec<DynamicObject>> {
        let discovery = Discovery::new(self.client.clone()).run().await?;

        let resources: Vec<(ApiResource, ApiCapabilities)> = discovery
            .groups()
            .filter(|group| !self.excluded_groups.iter().any(|g| g == group.name()))
            .flat_map(|group| group.recommended_resources())
            .filter(|(_, caps)| caps.supports_operation(verbs::LIST))
            .collect();
        tracing::debug!("Discovered {} listable resource types", resources.len());

        let mut results: Vec<_> = stream::iter(resources)
            .map(|(ar, caps)| {
                let api = self.api(&ar, &caps);
                async move {
                    let result = list_all(&api, &ar).await;
                    (ar, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        // Lists finish in any order; duplicate uids need a stable winner
        sort_by_type(&mut results);

        let mut objects = Vec::new();
        for (ar, result) in results {
            match result {
                Ok(items) => {
                    tracing::debug!("Listed {} {}", items.len(), ar.plural);
                    objects.extend(items);
                }
                // Missing RBAC or a broken aggregated API only hides one resource type
                Err(e) => tracing::warn!("Failed to list {} ({}): {}", ar.plural, ar.api_version, e),
            }
        }

        tracing::info!("Fetched {} objects from cluster", objects.len());
        Ok(objects)
    }

    fn default_namespace(&self) -> &str {
        match &self.namespace {
            Some(ns) => ns,
            None => self.client.default_namespace(),
        }
    }
}

/// Order list results by group, kind and version
///
/// Objects served by several groups (core and `events.k8s.io` Events) share
/// a uid, and the last one listed wins in the graph.
fn sort_by_type<T>(results: &mut [(ApiResource, T)]) {
    results.sort_by(|(a, _), (b, _)| {
        (&a.group, &a.kind, &a.version).cmp(&(&b.group, &b.kind, &b.version))
    });
}

/// List every page of one resource type
///
/// List items carry no type information, so it is filled in from the
/// discovered resource.
async fn list_all(api: &Api<DynamicObject>, ar: &ApiResource) -> Result<Vec<DynamicObject>, kube::Error> {
    let mut objects = Vec::new();
    let mut params = ListParams::default().limit(PAGE_SIZE);

    loop {
        let list = api.list(&params).await?;
        let token = list.metadata.continue_.clone();
        objects.extend(list.items.into_iter().map(|mut obj| {
            obj.types = Some(TypeMeta {
                api_version: ar.api_version.clone(),
                kind: ar.kind.clone(),
            });
            obj
        }));

        match token {
            Some(token) if !token.is_empty() => params = params.continue_token(&token),
            _ => break,
        }
    }

    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(group: &str, version: &str, kind: &str, plural: &str) -> ApiResource {
        let api_version = if group.is_empty() {
            version.to_string()
        } else {
            format!("{group}/{version}")
        };
        ApiResource {
            group: group.to_string(),
            version: version.to_string(),
            api_version,
            kind: kind.to_string(),
            plural: plural.to_string(),
        }
    }

    #[test]
    fn test_sort_by_type_is_independent_of_completion_order() {
        let mut first = vec![
            (resource("events.k8s.io", "v1", "Event", "events"), 1),
            (resource("", "v1", "Pod", "pods"), 2),
            (resource("", "v1", "Event", "events"), 3),
            (resource("apps", "v1", "Deployment", "deployments"), 4),
        ];
        let mut second = first.clone();
        second.reverse();

        sort_by_type(&mut first);
        sort_by_type(&mut second);

        let order: Vec<i32> = first.iter().map(|(_, n)| *n).collect();
        assert_eq!(order, vec![3, 2, 4, 1]);
        assert_eq!(order, second.iter().map(|(_, n)| *n).collect::<Vec<_>>());
        // The events.k8s.io copy is listed last, so it wins a shared uid
        assert_eq!(first.last().map(|(ar, _)| ar.group.as_str()), Some("events.k8s.io"));
    }
}
