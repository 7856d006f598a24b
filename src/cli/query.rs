//! Root object queries
//!
//! Parses the `RESOURCE [NAME]` arguments the way kubectl does and finds the
//! matching object in a snapshot.

use std::fmt;

use kube::core::DynamicObject;

use crate::graph::group_of;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Resource type must not be empty")]
    EmptyResource,

    #[error("Invalid resource \"{0}\": expected TYPE NAME, TYPE/NAME or TYPE.GROUP/NAME")]
    InvalidResource(String),

    #[error("Object name is required: use TYPE NAME or TYPE/NAME")]
    MissingName,

    #[error("Object name given twice: \"{0}\" and \"{1}\"")]
    ConflictingName(String, String),

    #[error("{query} not found in namespace \"{namespace}\"")]
    NotFound { query: String, namespace: String },

    #[error("{query} matches more than one object: {}", .matches.join(", "))]
    Ambiguous { query: String, matches: Vec<String> },
}

/// Short names understood in addition to kinds and plurals
///
/// Maps to the lowercase kind; the group is never implied so that e.g. `ing`
/// finds Ingresses of both the networking.k8s.io and extensions groups.
const SHORT_NAMES: &[(&str, &str)] = &[
    ("cj", "cronjob"),
    ("cm", "configmap"),
    ("crd", "customresourcedefinition"),
    ("csr", "certificatesigningrequest"),
    ("deploy", "deployment"),
    ("ds", "daemonset"),
    ("ep", "endpoints"),
    ("ev", "event"),
    ("hpa", "horizontalpodautoscaler"),
    ("ing", "ingress"),
    ("netpol", "networkpolicy"),
    ("no", "node"),
    ("ns", "namespace"),
    ("pc", "priorityclass"),
    ("pdb", "poddisruptionbudget"),
    ("po", "pod"),
    ("pv", "persistentvolume"),
    ("pvc", "persistentvolumeclaim"),
    ("rs", "replicaset"),
    ("sa", "serviceaccount"),
    ("sc", "storageclass"),
    ("sts", "statefulset"),
    ("svc", "service"),
];

/// Which object to show the dependents of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceQuery {
    /// Resource type as given: kind, plural or short name, lowercased
    pub resource: String,
    /// API group, possibly abbreviated (`apps`, `networking`)
    pub group: Option<String>,
    pub name: String,
}

impl ResourceQuery {
    /// Parse `TYPE NAME`, `TYPE/NAME` or `TYPE.GROUP/NAME`
    pub fn parse(resource: &str, name: Option<&str>) -> Result<Self, QueryError> {
        let resource = resource.trim();
        if resource.is_empty() {
            return Err(QueryError::EmptyResource);
        }

        let (type_part, inline_name) = match resource.split_once('/') {
            Some((_, n)) if n.is_empty() || n.contains('/') => {
                return Err(QueryError::InvalidResource(resource.to_string()));
            }
            Some((t, n)) => (t, Some(n)),
            None => (resource, None),
        };

        let name = match (inline_name, name.filter(|n| !n.is_empty())) {
            (Some(a), Some(b)) if a != b => {
                return Err(QueryError::ConflictingName(a.to_string(), b.to_string()));
            }
            (Some(n), _) | (None, Some(n)) => n.to_string(),
            (None, None) => return Err(QueryError::MissingName),
        };

        let (kind, group) = match type_part.split_once('.') {
            Some((k, g)) => (k, Some(g.to_lowercase())),
            None => (type_part, None),
        };
        if kind.is_empty() || group.as_deref() == Some("") {
            return Err(QueryError::InvalidResource(resource.to_string()));
        }

        Ok(Self {
            resource: kind.to_lowercase(),
            group,
            name,
        })
    }

    /// Whether objects of this group and kind are the requested type
    pub fn matches_type(&self, group: &str, kind: &str) -> bool {
        if let Some(wanted) = &self.group {
            let abbreviated = group
                .strip_prefix(wanted.as_str())
                .is_some_and(|rest| rest.starts_with('.'));
            if group != wanted.as_str() && !abbreviated {
                return false;
            }
        }

        let resource = SHORT_NAMES
            .iter()
            .find(|(short, _)| *short == self.resource)
            .map(|(_, kind)| *kind)
            .unwrap_or(self.resource.as_str());
        let kind = kind.to_lowercase();
        resource == kind || resource == plural(&kind)
    }

    /// Find the single object this query names
    ///
    /// Cluster-scoped objects match in any namespace.
    pub fn find_root<'o>(
        &self,
        objects: &'o [DynamicObject],
        namespace: &str,
    ) -> Result<&'o DynamicObject, QueryError> {
        let mut matches: Vec<&DynamicObject> = Vec::new();
        for obj in objects {
            let Some(types) = &obj.types else {
                continue;
            };
            if obj.metadata.name.as_deref() != Some(self.name.as_str())
                || !self.matches_type(group_of(&types.api_version), &types.kind)
            {
                continue;
            }
            let ns = obj.metadata.namespace.as_deref().unwrap_or("");
            if !ns.is_empty() && ns != namespace {
                continue;
            }
            // The same object may be served by several API groups
            if matches.iter().any(|m| m.metadata.uid.is_some() && m.metadata.uid == obj.metadata.uid) {
                continue;
            }
            matches.push(obj);
        }

        match matches.as_slice() {
            [root] => Ok(*root),
            [] => Err(QueryError::NotFound {
                query: self.to_string(),
                namespace: namespace.to_string(),
            }),
            _ => Err(QueryError::Ambiguous {
                query: self.to_string(),
                matches: matches.iter().map(|obj| describe(obj)).collect(),
            }),
        }
    }
}

impl fmt::Display for ResourceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}.{}/{}", self.resource, group, self.name),
            None => write!(f, "{}/{}", self.resource, self.name),
        }
    }
}

/// Lowercase plural of a lowercase kind, as the API server derives it
fn plural(kind: &str) -> String {
    if kind.ends_with("endpoints") {
        return kind.to_string();
    }
    if let Some(stem) = kind.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    if kind.ends_with('s') || kind.ends_with('x') || kind.ends_with("ch") || kind.ends_with("sh") {
        return format!("{kind}es");
    }
    format!("{kind}s")
}

fn describe(obj: &DynamicObject) -> String {
    let (api_version, kind) = obj
        .types
        .as_ref()
        .map(|t| (t.api_version.as_str(), t.kind.as_str()))
        .unwrap_or_default();
    let group = group_of(api_version);
    let kind = if group.is_empty() {
        kind.to_string()
    } else {
        format!("{kind}.{group}")
    };
    match obj.metadata.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => {
            format!("{}/{} (namespace {})", kind, obj.metadata.name.as_deref().unwrap_or(""), ns)
        }
        _ => format!("{}/{}", kind, obj.metadata.name.as_deref().unwrap_or("")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(api_version: &str, kind: &str, namespace: Option<&str>, name: &str, uid: &str) -> DynamicObject {
        let mut value = json!({
            "apiVersion": api_version,
            "kind": kind,
            "metadata": {"name": name, "uid": uid},
        });
        if let Some(ns) = namespace {
            value["metadata"]["namespace"] = json!(ns);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_forms() {
        let q = ResourceQuery::parse("deploy", Some("web")).unwrap();
        assert_eq!(q.resource, "deploy");
        assert_eq!(q.group, None);
        assert_eq!(q.name, "web");

        let q = ResourceQuery::parse("Deployment/web", None).unwrap();
        assert_eq!(q.resource, "deployment");
        assert_eq!(q.name, "web");

        let q = ResourceQuery::parse("deployments.apps/web", None).unwrap();
        assert_eq!(q.resource, "deployments");
        assert_eq!(q.group.as_deref(), Some("apps"));
        assert_eq!(q.to_string(), "deployments.apps/web");

        // Same name in both places is fine
        assert!(ResourceQuery::parse("svc/web", Some("web")).is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(ResourceQuery::parse(" ", None), Err(QueryError::EmptyResource)));
        assert!(matches!(ResourceQuery::parse("pod", None), Err(QueryError::MissingName)));
        assert!(matches!(
            ResourceQuery::parse("pod/a", Some("b")),
            Err(QueryError::ConflictingName(_, _))
        ));
        assert!(matches!(ResourceQuery::parse("pod/", None), Err(QueryError::InvalidResource(_))));
        assert!(matches!(ResourceQuery::parse("pod/a/b", None), Err(QueryError::InvalidResource(_))));
        assert!(matches!(ResourceQuery::parse("pod./a", None), Err(QueryError::InvalidResource(_))));
    }

    #[test]
    fn test_matches_type() {
        let q = |r: &str| ResourceQuery::parse(r, Some("x")).unwrap();
        assert!(q("po").matches_type("", "Pod"));
        assert!(q("pods").matches_type("", "Pod"));
        assert!(q("Pod").matches_type("", "Pod"));
        assert!(q("ing").matches_type("extensions", "Ingress"));
        assert!(q("ingresses").matches_type("networking.k8s.io", "Ingress"));
        assert!(q("networkpolicies").matches_type("networking.k8s.io", "NetworkPolicy"));
        assert!(q("ep").matches_type("", "Endpoints"));
        assert!(q("ingress.networking").matches_type("networking.k8s.io", "Ingress"));
        assert!(!q("ingress.networking").matches_type("extensions", "Ingress"));
        assert!(!q("deploy.app").matches_type("apps", "Deployment"));
        assert!(!q("po").matches_type("", "PodTemplate"));
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural("pod"), "pods");
        assert_eq!(plural("ingress"), "ingresses");
        assert_eq!(plural("networkpolicy"), "networkpolicies");
        assert_eq!(plural("gateway"), "gateways");
        assert_eq!(plural("endpoints"), "endpoints");
    }

    #[test]
    fn test_find_root() {
        let objects = vec![
            object("apps/v1", "Deployment", Some("shop"), "web", "d-1"),
            object("apps/v1", "Deployment", Some("blog"), "web", "d-2"),
            object("v1", "Node", None, "worker-1", "n-1"),
        ];

        let q = ResourceQuery::parse("deploy/web", None).unwrap();
        let root = q.find_root(&objects, "blog").unwrap();
        assert_eq!(root.metadata.uid.as_deref(), Some("d-2"));

        // Cluster-scoped objects ignore the namespace
        let q = ResourceQuery::parse("no", Some("worker-1")).unwrap();
        assert_eq!(q.find_root(&objects, "shop").unwrap().metadata.uid.as_deref(), Some("n-1"));

        let q = ResourceQuery::parse("deploy/web", None).unwrap();
        let err = q.find_root(&objects, "default").unwrap_err();
        assert_eq!(err.to_string(), "deploy/web not found in namespace \"default\"");
    }

    #[test]
    fn test_find_root_dedupes_and_detects_ambiguity() {
        let objects = vec![
            object("v1", "Event", Some("shop"), "web.1", "e-1"),
            object("events.k8s.io/v1", "Event", Some("shop"), "web.1", "e-1"),
            object("example.com/v1", "Widget", Some("shop"), "w", "w-1"),
            object("other.io/v1", "Widget", Some("shop"), "w", "w-2"),
        ];

        let q = ResourceQuery::parse("ev/web.1", None).unwrap();
        assert_eq!(q.find_root(&objects, "shop").unwrap().metadata.uid.as_deref(), Some("e-1"));

        let q = ResourceQuery::parse("widgets/w", None).unwrap();
        match q.find_root(&objects, "shop").unwrap_err() {
            QueryError::Ambiguous { matches, .. } => assert_eq!(
                matches,
                vec![
                    "Widget.example.com/w (namespace shop)",
                    "Widget.other.io/w (namespace shop)"
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }

        let q = ResourceQuery::parse("widgets.other.io/w", None).unwrap();
        assert_eq!(q.find_root(&objects, "shop").unwrap().metadata.uid.as_deref(), Some("w-2"));
    }
}
