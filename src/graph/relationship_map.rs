//! Relationship declarations produced by extractors

use std::collections::BTreeMap;

use super::models::{
    LabelSelector, LabelSelectorKey, Reference, ReferenceKey, Relationship, RelationshipSet, Uid,
};

/// Relationships one Kubernetes object declares with other objects in the cluster
///
/// Dependencies are objects this object relies on; once resolved they gain this
/// object as a dependent. Dependents are objects that rely on this object.
/// A map is built fresh for each extractor call and consumed by the resolver.
#[derive(Debug, Clone, Default)]
pub struct RelationshipMap {
    pub dependencies_by_label_selector: BTreeMap<LabelSelectorKey, RelationshipSet>,
    pub dependencies_by_ref: BTreeMap<ReferenceKey, RelationshipSet>,
    pub dependencies_by_uid: BTreeMap<Uid, RelationshipSet>,
    pub dependents_by_label_selector: BTreeMap<LabelSelectorKey, RelationshipSet>,
    pub dependents_by_ref: BTreeMap<ReferenceKey, RelationshipSet>,
    pub dependents_by_uid: BTreeMap<Uid, RelationshipSet>,
    /// Selector values for every selector key seen by this map
    pub label_selectors: BTreeMap<LabelSelectorKey, LabelSelector>,
}

impl RelationshipMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dependency_by_ref(&mut self, reference: &Reference, r: impl Into<Relationship>) {
        self.dependencies_by_ref
            .entry(reference.key())
            .or_default()
            .insert(r.into());
    }

    pub fn add_dependency_by_label_selector(
        &mut self,
        selector: LabelSelector,
        r: impl Into<Relationship>,
    ) {
        let key = selector.key();
        self.dependencies_by_label_selector
            .entry(key.clone())
            .or_default()
            .insert(r.into());
        self.label_selectors.insert(key, selector);
    }

    pub fn add_dependency_by_uid(&mut self, uid: impl Into<Uid>, r: impl Into<Relationship>) {
        self.dependencies_by_uid
            .entry(uid.into())
            .or_default()
            .insert(r.into());
    }

    pub fn add_dependent_by_ref(&mut self, reference: &Reference, r: impl Into<Relationship>) {
        self.dependents_by_ref
            .entry(reference.key())
            .or_default()
            .insert(r.into());
    }

    pub fn add_dependent_by_label_selector(
        &mut self,
        selector: LabelSelector,
        r: impl Into<Relationship>,
    ) {
        let key = selector.key();
        self.dependents_by_label_selector
            .entry(key.clone())
            .or_default()
            .insert(r.into());
        self.label_selectors.insert(key, selector);
    }

    pub fn add_dependent_by_uid(&mut self, uid: impl Into<Uid>, r: impl Into<Relationship>) {
        self.dependents_by_uid
            .entry(uid.into())
            .or_default()
            .insert(r.into());
    }

    /// Number of distinct addresses declared across all schemes
    pub fn len(&self) -> usize {
        self.dependencies_by_label_selector.len()
            + self.dependencies_by_ref.len()
            + self.dependencies_by_uid.len()
            + self.dependents_by_label_selector.len()
            + self.dependents_by_ref.len()
            + self.dependents_by_uid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
