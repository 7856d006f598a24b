//! Extractor dispatch table
//!
//! Maps a (group, kind) pair to the extractor that translates one object of
//! that kind into relationship declarations. The resolver only talks to this
//! table, so supporting a new kind means registering one more extractor.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::node::Node;
use super::relationship_map::RelationshipMap;

/// Failure while extracting relationships from a single object
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Invalid field {field}: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid label selector in {field}: {message}")]
    InvalidSelector { field: String, message: String },
}

/// Result type for extractors
pub type ExtractResult = Result<RelationshipMap, ExtractError>;

/// API group and kind of a Kubernetes object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.kind)
        } else {
            write!(f, "{}.{}", self.kind, self.group)
        }
    }
}

/// Translates one object into relationship declarations
pub trait Extractor: Send + Sync {
    fn extract(&self, node: &Node<'_>) -> ExtractResult;
}

impl<F> Extractor for F
where
    F: Fn(&Node<'_>) -> ExtractResult + Send + Sync,
{
    fn extract(&self, node: &Node<'_>) -> ExtractResult {
        self(node)
    }
}

/// Registry of extractors keyed by group and kind
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<GroupKind, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register an extractor, replacing any previous one for the same kind
    pub fn register(
        &mut self,
        group: impl Into<String>,
        kind: impl Into<String>,
        extractor: impl Extractor + 'static,
    ) -> &mut Self {
        self.extractors
            .insert(GroupKind::new(group, kind), Arc::new(extractor));
        self
    }

    /// Get the extractor for a group and kind
    pub fn get(&self, group: &str, kind: &str) -> Option<&dyn Extractor> {
        self.extractors
            .get(&GroupKind::new(group, kind))
            .map(|e| e.as_ref())
    }

    pub fn contains(&self, group: &str, kind: &str) -> bool {
        self.get(group, kind).is_some()
    }

    /// Registered kinds, sorted
    pub fn group_kinds(&self) -> Vec<&GroupKind> {
        let mut kinds: Vec<_> = self.extractors.keys().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("kinds", &self.group_kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(_: &Node<'_>) -> ExtractResult {
        Ok(RelationshipMap::new())
    }

    fn failing(_: &Node<'_>) -> ExtractResult {
        Err(ExtractError::MissingField("spec".to_string()))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ExtractorRegistry::new();
        registry
            .register("", "Pod", empty)
            .register("apps", "Deployment", failing);

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("", "Pod"));
        assert!(registry.contains("apps", "Deployment"));
        // Group is part of the key
        assert!(!registry.contains("", "Deployment"));
        assert!(!registry.contains("apps", "Pod"));
    }

    #[test]
    fn test_group_kinds_sorted() {
        let mut registry = ExtractorRegistry::new();
        registry.register("rbac.authorization.k8s.io", "RoleBinding", empty);
        registry.register("", "Service", empty);
        registry.register("", "Pod", empty);

        let kinds: Vec<String> = registry.group_kinds().iter().map(|gk| gk.to_string()).collect();
        assert_eq!(
            kinds,
            vec!["Pod", "Service", "RoleBinding.rbac.authorization.k8s.io"]
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = ExtractorRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.get("", "Pod").is_none());
    }
}
