//! Fat nodes: chain slots carrying bounded, version-tagged modification logs.
//!
//! A [`VersionedNode`] stores the value and next-pointer it was created
//! with, plus up to [`MODIFICATION_CAPACITY`] records of the form
//! "this field became X at version V". Reading a field as of some version
//! is a prefix scan over its log. Once a node has no room left for a change
//! it is never written again; the map rebuilds it instead (see
//! [`VersionedNode::rebuilt_with`]).

use arrayvec::ArrayVec;

use super::Version;
use super::arena::NodeIndex;
use crate::config::{MODIFICATION_CAPACITY, ModificationBudget};

// =============================================================================
// Modification Log
// =============================================================================

/// One version-tagged field assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Modification<T> {
    pub(crate) value: T,
    pub(crate) version: Version,
}

/// A version-ascending log of at most [`MODIFICATION_CAPACITY`] records.
#[derive(Clone, Debug)]
pub(crate) struct ModificationLog<T> {
    records: ArrayVec<Modification<T>, MODIFICATION_CAPACITY>,
}

impl<T> ModificationLog<T> {
    pub(crate) fn new() -> Self {
        Self {
            records: ArrayVec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_at_capacity(&self) -> bool {
        self.records.is_full()
    }

    /// Appends a record. Callers check for room first.
    pub(crate) fn push(&mut self, value: T, version: Version) {
        debug_assert!(
            self.records
                .last()
                .is_none_or(|last| last.version <= version),
            "modification log must stay version-ascending"
        );
        self.records.push(Modification { value, version });
    }

    /// Returns the field as of `version`, starting from `base`.
    pub(crate) fn project<'a>(&'a self, base: &'a T, version: Version) -> &'a T {
        self.records
            .iter()
            .take_while(|record| record.version <= version)
            .last()
            .map_or(base, |record| &record.value)
    }

    /// Returns the most recent assignment, or `base` if there is none.
    pub(crate) fn latest<'a>(&'a self, base: &'a T) -> &'a T {
        self.records.last().map_or(base, |record| &record.value)
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Modification<T>> {
        self.records.iter()
    }
}

// =============================================================================
// Field Changes and Back-References
// =============================================================================

/// The field a change targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Value,
    Next,
}

/// A pending assignment to one field of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FieldChange<V> {
    Value(V),
    Next(Option<NodeIndex>),
}

impl<V> FieldChange<V> {
    pub(crate) const fn kind(&self) -> FieldKind {
        match self {
            Self::Value(_) => FieldKind::Value,
            Self::Next(_) => FieldKind::Next,
        }
    }
}

/// Who currently links to a node in the latest chain.
///
/// Non-owning; only consulted to propagate rebuilds upward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Predecessor {
    /// The node is the current head, so the map's version index links to it.
    Head,
    /// Another node's next-pointer links to it.
    Node(NodeIndex),
}

// =============================================================================
// VersionedNode
// =============================================================================

/// A key/value slot of the versioned chain.
#[derive(Clone, Debug)]
pub(crate) struct VersionedNode<K, V> {
    key: K,
    base_value: V,
    value_log: ModificationLog<V>,
    base_next: Option<NodeIndex>,
    next_log: ModificationLog<Option<NodeIndex>>,
    back: Predecessor,
}

impl<K, V> VersionedNode<K, V> {
    pub(crate) fn new(key: K, value: V, next: Option<NodeIndex>, back: Predecessor) -> Self {
        Self {
            key,
            base_value: value,
            value_log: ModificationLog::new(),
            base_next: next,
            next_log: ModificationLog::new(),
            back,
        }
    }

    pub(crate) const fn key(&self) -> &K {
        &self.key
    }

    pub(crate) const fn back(&self) -> Predecessor {
        self.back
    }

    pub(crate) const fn set_back(&mut self, back: Predecessor) {
        self.back = back;
    }

    pub(crate) fn value_at(&self, version: Version) -> &V {
        self.value_log.project(&self.base_value, version)
    }

    pub(crate) fn next_at(&self, version: Version) -> Option<NodeIndex> {
        *self.next_log.project(&self.base_next, version)
    }

    pub(crate) fn latest_value(&self) -> &V {
        self.value_log.latest(&self.base_value)
    }

    pub(crate) fn latest_next(&self) -> Option<NodeIndex> {
        *self.next_log.latest(&self.base_next)
    }

    /// Total number of records across both logs.
    pub(crate) fn modification_count(&self) -> usize {
        self.value_log.len() + self.next_log.len()
    }

    #[cfg(test)]
    pub(crate) fn value_log(&self) -> &ModificationLog<V> {
        &self.value_log
    }

    #[cfg(test)]
    pub(crate) fn next_log(&self) -> &ModificationLog<Option<NodeIndex>> {
        &self.next_log
    }

    /// Returns `true` if a change to `kind` can still be recorded in place.
    pub(crate) fn has_room_for(&self, kind: FieldKind, budget: ModificationBudget) -> bool {
        match budget {
            ModificationBudget::Shared => self.modification_count() < MODIFICATION_CAPACITY,
            ModificationBudget::PerField => match kind {
                FieldKind::Value => !self.value_log.is_at_capacity(),
                FieldKind::Next => !self.next_log.is_at_capacity(),
            },
        }
    }

    /// Records `change` in place at `version`.
    pub(crate) fn record(&mut self, change: FieldChange<V>, version: Version) {
        match change {
            FieldChange::Value(value) => self.value_log.push(value, version),
            FieldChange::Next(next) => self.next_log.push(next, version),
        }
    }

    /// Builds the replacement for this node: its latest state flattened
    /// into the base fields, with `change` applied and both logs empty.
    pub(crate) fn rebuilt_with(&self, change: FieldChange<V>) -> Self
    where
        K: Clone,
        V: Clone,
    {
        let (value, next) = match change {
            FieldChange::Value(value) => (value, self.latest_next()),
            FieldChange::Next(next) => (self.latest_value().clone(), next),
        };
        Self::new(self.key.clone(), value, next, self.back)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn version(number: u64) -> Version {
        Version::new(number)
    }

    #[rstest]
    fn test_new_node_projects_base_fields() {
        let node = VersionedNode::new(1, "one", Some(NodeIndex::new(4)), Predecessor::Head);
        assert_eq!(*node.value_at(version(0)), "one");
        assert_eq!(node.next_at(version(100)), Some(NodeIndex::new(4)));
        assert_eq!(node.modification_count(), 0);
    }

    #[rstest]
    #[case(1, "one")]
    #[case(2, "one")]
    #[case(3, "three")]
    #[case(4, "three")]
    #[case(5, "five")]
    #[case(99, "five")]
    fn test_value_projection_is_prefix_scan(#[case] at: u64, #[case] expected: &str) {
        let mut node = VersionedNode::new(1, "one", None, Predecessor::Head);
        node.record(FieldChange::Value("three"), version(3));
        node.record(FieldChange::Value("five"), version(5));
        assert_eq!(*node.value_at(version(at)), expected);
    }

    #[rstest]
    fn test_next_projection_tracks_relinks() {
        let mut node: VersionedNode<i32, i32> = VersionedNode::new(1, 10, None, Predecessor::Head);
        node.record(FieldChange::Next(Some(NodeIndex::new(7))), version(2));
        assert_eq!(node.next_at(version(1)), None);
        assert_eq!(node.next_at(version(2)), Some(NodeIndex::new(7)));
        assert_eq!(node.latest_next(), Some(NodeIndex::new(7)));
    }

    #[rstest]
    fn test_shared_budget_counts_both_logs() {
        let mut node: VersionedNode<i32, i32> = VersionedNode::new(1, 10, None, Predecessor::Head);
        node.record(FieldChange::Value(11), version(2));
        assert!(node.has_room_for(FieldKind::Next, ModificationBudget::Shared));
        node.record(FieldChange::Next(Some(NodeIndex::new(3))), version(3));
        assert!(!node.has_room_for(FieldKind::Value, ModificationBudget::Shared));
        assert!(!node.has_room_for(FieldKind::Next, ModificationBudget::Shared));
    }

    #[rstest]
    fn test_per_field_budget_counts_each_log() {
        let mut node: VersionedNode<i32, i32> = VersionedNode::new(1, 10, None, Predecessor::Head);
        node.record(FieldChange::Value(11), version(2));
        node.record(FieldChange::Value(12), version(3));
        assert!(!node.has_room_for(FieldKind::Value, ModificationBudget::PerField));
        assert!(node.has_room_for(FieldKind::Next, ModificationBudget::PerField));
    }

    #[rstest]
    fn test_rebuilt_with_flattens_and_applies_change() {
        let mut node = VersionedNode::new(5, 50, None, Predecessor::Node(NodeIndex::new(2)));
        node.record(FieldChange::Value(51), version(2));
        node.record(FieldChange::Next(Some(NodeIndex::new(9))), version(3));

        let replacement = node.rebuilt_with(FieldChange::Value(52));

        assert_eq!(*replacement.key(), 5);
        assert_eq!(*replacement.value_at(version(0)), 52);
        assert_eq!(replacement.next_at(version(0)), Some(NodeIndex::new(9)));
        assert_eq!(replacement.back(), Predecessor::Node(NodeIndex::new(2)));
        assert_eq!(replacement.modification_count(), 0);

        // The retired node still answers for its own history.
        assert_eq!(*node.value_at(version(1)), 50);
        assert_eq!(*node.value_at(version(2)), 51);
    }

    #[rstest]
    fn test_rebuilt_with_next_change() {
        let node: VersionedNode<i32, i32> =
            VersionedNode::new(5, 50, Some(NodeIndex::new(1)), Predecessor::Head);
        let replacement = node.rebuilt_with(FieldChange::Next(Some(NodeIndex::new(8))));
        assert_eq!(replacement.latest_next(), Some(NodeIndex::new(8)));
        assert_eq!(*replacement.latest_value(), 50);
    }

    #[rstest]
    fn test_log_iter_is_version_ascending() {
        let mut log = ModificationLog::new();
        log.push('a', version(1));
        log.push('b', version(4));
        let versions: Vec<u64> = log.iter().map(|record| record.version.get()).collect();
        assert_eq!(versions, vec![1, 4]);
        assert!(log.is_at_capacity());
    }
}
