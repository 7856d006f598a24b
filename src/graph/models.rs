//! Addressing types for Kubernetes objects in the relationship graph
//!
//! An object can be addressed three ways: by UID, by [`Reference`]
//! (group, kind, namespace, name) or by [`LabelSelector`] (group, kind,
//! namespace, selector). References and selectors canonicalize to string keys
//! so they can be used as map keys.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use kube::core::Selector;
use serde::Serialize;

/// Opaque cluster-unique object identifier
pub type Uid = String;

/// Separator between key components.
///
/// Backslashes are not legal in Kubernetes API groups, kinds, namespaces or
/// object names, so keys built with it are injective.
const KEY_SEPARATOR: char = '\\';

/// Compact representation of a [`Reference`], usable as a map key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ReferenceKey(String);

impl ReferenceKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to exactly one Kubernetes object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl Reference {
    pub fn new(
        group: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Convert the reference into its canonical key
    pub fn key(&self) -> ReferenceKey {
        ReferenceKey(format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.group,
            self.kind,
            self.namespace,
            self.name,
            sep = KEY_SEPARATOR
        ))
    }
}

/// Compact representation of a [`LabelSelector`], usable as a map key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LabelSelectorKey(String);

impl LabelSelectorKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelSelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a collection of Kubernetes objects matched by labels
#[derive(Debug, Clone)]
pub struct LabelSelector {
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub selector: Selector,
}

impl LabelSelector {
    pub fn new(
        group: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        selector: Selector,
    ) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
            namespace: namespace.into(),
            selector,
        }
    }

    /// Convert the selector into its canonical key
    pub fn key(&self) -> LabelSelectorKey {
        LabelSelectorKey(format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.group,
            self.kind,
            self.namespace,
            self.selector,
            sep = KEY_SEPARATOR
        ))
    }
}

/// Why an edge exists between two objects
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Relationship(Cow<'static, str>);

impl Relationship {
    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Relationship {
    fn from(tag: &'static str) -> Self {
        Self::from_static(tag)
    }
}

impl From<String> for Relationship {
    fn from(tag: String) -> Self {
        Self(Cow::Owned(tag))
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner reference edge
pub const OWNER_REF: Relationship = Relationship::from_static("OwnerRef");
/// Owner reference edge where the owner is the managing controller
pub const CONTROLLER_REF: Relationship = Relationship::from_static("ControllerRef");

/// Deduplicated set of relationships, iterated in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RelationshipSet(BTreeSet<Relationship>);

impl RelationshipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relationship, returns false if it was already present
    pub fn insert(&mut self, relationship: Relationship) -> bool {
        self.0.insert(relationship)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|r| r.as_str() == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Contents as a sorted list of tags
    pub fn list(&self) -> Vec<&str> {
        self.0.iter().map(Relationship::as_str).collect()
    }
}

impl fmt::Display for RelationshipSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.list().join(" "))
    }
}

impl<R: Into<Relationship>> FromIterator<R> for RelationshipSet {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'s> IntoIterator for &'s RelationshipSet {
    type Item = &'s Relationship;
    type IntoIter = std::collections::btree_set::Iter<'s, Relationship>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
