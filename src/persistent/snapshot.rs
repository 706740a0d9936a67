//! Read-only views of a map as of one version.
//!
//! A [`Snapshot`] pins a head node and a version; every read walks the
//! chain from that head using the pinned version's field projections.
//! Later insertions never change what a snapshot reports.
//!
//! # Examples
//!
//! ```rust
//! use fatmap::persistent::PersistentOrderedMap;
//!
//! let mut map = PersistentOrderedMap::new();
//! map.insert(2, "two");
//! let before = map.insert(1, "one");
//! map.insert(3, "three");
//!
//! let snapshot = map.snapshot(before).unwrap();
//! let entries: Vec<(&i32, &&str)> = snapshot.iter().collect();
//! assert_eq!(entries, vec![(&1, &"one"), (&2, &"two")]);
//! assert_eq!(snapshot.to_string(), "{1: one, 2: two}");
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;

use super::Version;
use super::arena::{NodeArena, NodeIndex};

// =============================================================================
// Snapshot Definition
// =============================================================================

/// The contents of a [`PersistentOrderedMap`](super::PersistentOrderedMap)
/// as of a single version.
///
/// Obtained from [`snapshot`](super::PersistentOrderedMap::snapshot) or
/// [`latest`](super::PersistentOrderedMap::latest). Entries are visited in
/// ascending key order.
///
/// # Time Complexity
///
/// | Operation      | Complexity |
/// |----------------|------------|
/// | `version`      | O(1)       |
/// | `first`        | O(1)       |
/// | `get`          | O(N)       |
/// | `contains_key` | O(N)       |
/// | `len`          | O(N)       |
/// | `iter`         | O(1) + O(1) per step |
pub struct Snapshot<'a, K, V> {
    arena: &'a NodeArena<K, V>,
    head: NodeIndex,
    version: Version,
}

impl<'a, K, V> Snapshot<'a, K, V> {
    pub(crate) const fn new(arena: &'a NodeArena<K, V>, head: NodeIndex, version: Version) -> Self {
        Self {
            arena,
            head,
            version,
        }
    }

    /// Returns the version this snapshot reads at.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Returns an iterator over the entries in ascending key order.
    #[must_use]
    pub const fn iter(&self) -> SnapshotIterator<'a, K, V> {
        SnapshotIterator {
            arena: self.arena,
            cursor: Some(self.head),
            version: self.version,
        }
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &'a K> + use<'a, K, V> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in key order.
    pub fn values(&self) -> impl Iterator<Item = &'a V> + use<'a, K, V> {
        self.iter().map(|(_, value)| value)
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn first(&self) -> (&'a K, &'a V) {
        let node = &self.arena[self.head];
        (node.key(), node.value_at(self.version))
    }

    /// Returns the number of entries visible at this version.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if no entries are visible at this version.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Returns the value stored under `key` at this version.
    ///
    /// The key may be any borrowed form of the map's key type, but the
    /// ordering on the borrowed form must match the ordering on the key type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fatmap::persistent::PersistentOrderedMap;
    ///
    /// let mut map = PersistentOrderedMap::new();
    /// map.insert("alpha".to_string(), 1);
    ///
    /// let snapshot = map.latest().unwrap();
    /// assert_eq!(snapshot.get("alpha"), Some(&1));
    /// assert_eq!(snapshot.get("beta"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&'a V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        for (candidate, value) in self.iter() {
            match key.cmp(candidate.borrow()) {
                Ordering::Equal => return Some(value),
                // Keys ascend along the chain, so the key cannot appear later.
                Ordering::Less => return None,
                Ordering::Greater => {}
            }
        }
        None
    }

    /// Returns `true` if `key` has an entry at this version.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K, V> Clone for Snapshot<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Snapshot<'_, K, V> {}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the entries of a [`Snapshot`], in ascending key order.
pub struct SnapshotIterator<'a, K, V> {
    arena: &'a NodeArena<K, V>,
    cursor: Option<NodeIndex>,
    version: Version,
}

impl<'a, K, V> Iterator for SnapshotIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.arena[self.cursor?];
        self.cursor = node.next_at(self.version);
        Some((node.key(), node.value_at(self.version)))
    }
}

impl<K, V> FusedIterator for SnapshotIterator<'_, K, V> {}

impl<K, V> Clone for SnapshotIterator<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            cursor: self.cursor,
            version: self.version,
        }
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<'a, K, V> IntoIterator for Snapshot<'a, K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = SnapshotIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &Snapshot<'a, K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = SnapshotIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Snapshots are equal when they list the same entries, whatever their
/// versions or source maps.
impl<K: PartialEq, V: PartialEq> PartialEq for Snapshot<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for Snapshot<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Snapshot<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Snapshot<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for Snapshot<'_, K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::persistent::PersistentOrderedMap;
    use rstest::rstest;

    fn sample_map() -> PersistentOrderedMap<i32, String> {
        [(3, "three"), (1, "one"), (2, "two")]
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect()
    }

    #[rstest]
    fn test_iter_is_key_ascending() {
        let map = sample_map();
        let snapshot = map.latest().unwrap();
        let keys: Vec<i32> = snapshot.keys().copied().collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[rstest]
    fn test_values_follow_key_order() {
        let map = sample_map();
        let values: Vec<&str> = map
            .latest()
            .unwrap()
            .values()
            .map(String::as_str)
            .collect();
        assert_eq!(values, vec!["one", "two", "three"]);
    }

    #[rstest]
    fn test_first_returns_smallest_key() {
        let map = sample_map();
        let snapshot = map.latest().unwrap();
        assert_eq!(snapshot.first(), (&1, &"one".to_string()));
    }

    #[rstest]
    fn test_len_and_is_empty() {
        let map = sample_map();
        let snapshot = map.latest().unwrap();
        assert_eq!(snapshot.len(), 3);
        assert!(!snapshot.is_empty());
    }

    #[rstest]
    fn test_get_stops_at_larger_key() {
        let map = sample_map();
        let snapshot = map.latest().unwrap();
        assert_eq!(snapshot.get(&2), Some(&"two".to_string()));
        assert_eq!(snapshot.get(&0), None);
        assert_eq!(snapshot.get(&4), None);
        assert!(snapshot.contains_key(&3));
    }

    #[rstest]
    fn test_display_and_debug() {
        let map = sample_map();
        let snapshot = map.latest().unwrap();
        assert_eq!(format!("{snapshot}"), "{1: one, 2: two, 3: three}");
        assert_eq!(
            format!("{snapshot:?}"),
            r#"{1: "one", 2: "two", 3: "three"}"#
        );
    }

    #[rstest]
    fn test_equality_ignores_version() {
        let mut map = sample_map();
        let before = map.current_version();
        map.insert(2, "two".to_string());
        let old = map.snapshot(before).unwrap();
        let new = map.latest().unwrap();
        assert_ne!(old.version(), new.version());
        assert_eq!(old, new);
    }

    #[rstest]
    fn test_iterator_is_fused() {
        let map = sample_map();
        let mut iterator = map.latest().unwrap().iter();
        assert_eq!(iterator.by_ref().count(), 3);
        assert_eq!(iterator.next(), None);
        assert_eq!(iterator.next(), None);
    }
}
