//! Partially persistent ordered map built on fat nodes.
//!
//! This module provides [`PersistentOrderedMap`], an ordered map that keeps
//! every past version queryable while only the latest version accepts
//! insertions.
//!
//! # Overview
//!
//! Entries live in a key-ascending singly linked chain of
//! [`VersionedNode`]s. Each node absorbs a small, fixed number of in-place
//! modifications (value updates or relinks), each tagged with the version
//! that made it. When a node has no room left, it is retired and replaced by
//! a fresh copy holding its latest state; the copy is spliced in by
//! relinking its predecessor, which may in turn be full and need a copy of
//! its own. The cascade stops at the first node with room, or at the head,
//! in which case the replacement head is recorded in the version index.
//!
//! - O(N) insert (walk to the insertion point) plus an amortized O(1) rebuild
//! - O(N) get at any version
//! - O(log H) head lookup, where H is the number of head changes
//!
//! Retired nodes are never freed or written again: any older version may
//! still walk through them.
//!
//! # Examples
//!
//! ```rust
//! use fatmap::persistent::PersistentOrderedMap;
//!
//! let mut map = PersistentOrderedMap::new();
//! for key in 0..10 {
//!     map.insert(key, key);
//! }
//! let first = map.current_version();
//!
//! for key in 0..20 {
//!     map.insert(key, key + 10);
//! }
//! let second = map.current_version();
//!
//! assert_eq!(map.search(&5, first), 5);
//! assert_eq!(map.search(&15, first), 0); // absent, so the default value
//! assert_eq!(map.search(&15, second), 25);
//! ```

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::iter::FromIterator;

use tracing::{debug, trace};

use super::Version;
use super::arena::{NodeArena, NodeIndex};
use super::node::{FieldChange, FieldKind, Predecessor, VersionedNode};
use super::snapshot::Snapshot;
use crate::config::MapConfig;
use crate::error::PersistentMapError;

// =============================================================================
// Statistics
// =============================================================================

/// Counters describing how much history a map is carrying.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MapStatistics {
    /// Number of versions created so far (equal to the current version).
    pub versions: u64,
    /// Number of nodes ever allocated, live and retired.
    pub nodes: usize,
    /// Number of entries in the version-to-head index.
    pub head_changes: usize,
    /// Number of full nodes replaced by a rebuilt copy.
    pub rebuilds: usize,
    /// Largest number of modification records held by any node.
    pub max_node_modifications: usize,
}

// =============================================================================
// Insertion Planning
// =============================================================================

/// Where a new key/value pair lands in the latest chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    /// The map has no entries yet.
    Empty,
    /// The key sorts before the current head.
    NewHead { head: NodeIndex },
    /// The key already has a node; its value changes.
    Update { node: NodeIndex },
    /// The key goes between `predecessor` and `successor`.
    Splice {
        predecessor: NodeIndex,
        successor: Option<NodeIndex>,
    },
}

// =============================================================================
// PersistentOrderedMap Definition
// =============================================================================

/// A partially persistent ordered map.
///
/// Every call to [`insert`](Self::insert) creates a new [`Version`]. Any
/// version, once created, can be read back through
/// [`get`](Self::get), [`search`](Self::search) or
/// [`snapshot`](Self::snapshot) and always reports the same contents.
///
/// All nodes are owned by an arena inside the map and refer to each other
/// by index. Keys are never removed.
///
/// # Time Complexity
///
/// | Operation         | Complexity                    |
/// |-------------------|-------------------------------|
/// | `new`             | O(1)                          |
/// | `insert`          | O(N) walk + amortized O(1)    |
/// | `get` / `search`  | O(log H + N)                  |
/// | `snapshot`        | O(log H)                      |
/// | `current_version` | O(1)                          |
///
/// # Examples
///
/// ```rust
/// use fatmap::persistent::PersistentOrderedMap;
///
/// let mut map = PersistentOrderedMap::new();
/// let first = map.insert("apple", 1);
/// let second = map.insert("apple", 2);
///
/// assert_eq!(map.get(&"apple", first), Ok(&1));
/// assert_eq!(map.get(&"apple", second), Ok(&2));
/// assert_eq!(map.current_version(), second);
/// ```
#[derive(Clone)]
pub struct PersistentOrderedMap<K, V> {
    /// Every node ever created
    arena: NodeArena<K, V>,
    /// Head node valid from each version at which the head changed
    heads: BTreeMap<Version, NodeIndex>,
    /// Latest version handed out
    version: Version,
    config: MapConfig,
    rebuilds: usize,
}

impl<K, V> PersistentOrderedMap<K, V> {
    /// Creates an empty map with the default configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fatmap::persistent::{PersistentOrderedMap, Version};
    ///
    /// let map: PersistentOrderedMap<i32, String> = PersistentOrderedMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.current_version(), Version::INITIAL);
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            heads: BTreeMap::new(),
            version: Version::INITIAL,
            config: MapConfig::new(),
            rebuilds: 0,
        }
    }

    /// Creates an empty map with an explicit configuration.
    #[must_use]
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            arena: NodeArena::with_capacity(config.initial_node_capacity),
            heads: BTreeMap::new(),
            version: Version::INITIAL,
            config,
            rebuilds: 0,
        }
    }

    /// Returns the configuration the map was created with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Returns the latest version, i.e. the number of insertions so far.
    #[inline]
    #[must_use]
    pub const fn current_version(&self) -> Version {
        self.version
    }

    /// Returns the earliest version that has any entries.
    #[must_use]
    pub fn first_version(&self) -> Option<Version> {
        self.heads.first_key_value().map(|(version, _)| *version)
    }

    /// Returns `true` if nothing has been inserted yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Returns counters describing the map's retained history.
    #[must_use]
    pub fn statistics(&self) -> MapStatistics {
        MapStatistics {
            versions: self.version.get(),
            nodes: self.arena.len(),
            head_changes: self.heads.len(),
            rebuilds: self.rebuilds,
            max_node_modifications: self
                .arena
                .iter()
                .map(|(_, node)| node.modification_count())
                .max()
                .unwrap_or(0),
        }
    }

    /// Returns a read-only view of the map as of `version`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistentMapError::VersionOutOfRange`] if `version`
    /// precedes the first insertion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fatmap::persistent::PersistentOrderedMap;
    ///
    /// let mut map = PersistentOrderedMap::new();
    /// let version = map.insert(1, 'a');
    /// map.insert(2, 'b');
    ///
    /// assert_eq!(map.snapshot(version).unwrap().len(), 1);
    /// ```
    pub fn snapshot(&self, version: Version) -> Result<Snapshot<'_, K, V>, PersistentMapError> {
        let head = self.head_at(version)?;
        Ok(Snapshot::new(&self.arena, head, version))
    }

    /// Returns a view of the latest version, or `None` for an empty map.
    #[must_use]
    pub fn latest(&self) -> Option<Snapshot<'_, K, V>> {
        self.heads
            .last_key_value()
            .map(|(_, head)| Snapshot::new(&self.arena, *head, self.version))
    }

    /// Returns the head valid at `version`: the one recorded at the greatest
    /// head-change version not after it.
    fn head_at(&self, version: Version) -> Result<NodeIndex, PersistentMapError> {
        self.heads
            .range(..=version)
            .next_back()
            .map(|(_, head)| *head)
            .ok_or_else(|| PersistentMapError::VersionOutOfRange {
                requested: version,
                earliest: self.first_version(),
            })
    }

    fn record_head(&mut self, version: Version, head: NodeIndex) {
        debug!(version = %version, head = head.get(), "recorded new head");
        self.heads.insert(version, head);
    }
}

impl<K: Ord + Clone, V: Clone> PersistentOrderedMap<K, V> {
    /// Inserts or updates `key`, creating and returning a new version.
    ///
    /// Earlier versions keep reporting whatever they reported before.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow and aborts if the allocator fails, like
    /// [`Vec::push`]. Use [`try_insert`](Self::try_insert) to observe either
    /// failure instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fatmap::persistent::PersistentOrderedMap;
    ///
    /// let mut map = PersistentOrderedMap::new();
    /// let first = map.insert(3, "three");
    /// let second = map.insert(1, "one");
    ///
    /// assert_eq!(first.get(), 1);
    /// assert_eq!(second.get(), 2);
    /// assert!(!map.contains_key(&1, first));
    /// assert!(map.contains_key(&1, second));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Version {
        let reserved = self.insert_with(key, value, |arena, additional| {
            arena.reserve(additional);
            Ok::<(), Infallible>(())
        });
        match reserved {
            Ok(version) => version,
            Err(never) => match never {},
        }
    }

    /// Inserts or updates `key`, returning the new version.
    ///
    /// Node storage for the whole rebuild cascade is reserved before
    /// anything changes, so on failure the map, including its version
    /// counter, is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`PersistentMapError::AllocationFailure`] if node storage
    /// cannot grow.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Version, PersistentMapError> {
        Ok(self.insert_with(key, value, NodeArena::try_reserve)?)
    }

    /// Shared insertion path; `reserve` must make room for the given number
    /// of pushes or fail without touching the arena.
    fn insert_with<R, E>(&mut self, key: K, value: V, reserve: R) -> Result<Version, E>
    where
        R: FnOnce(&mut NodeArena<K, V>, usize) -> Result<(), E>,
    {
        let placement = self.locate(&key);
        let planned = self.planned_allocations(placement);
        reserve(&mut self.arena, planned)?;

        let version = self.version.next();
        self.version = version;

        match placement {
            Placement::Empty => {
                let node = self
                    .arena
                    .push(VersionedNode::new(key, value, None, Predecessor::Head));
                self.record_head(version, node);
            }
            Placement::NewHead { head } => {
                let node = self
                    .arena
                    .push(VersionedNode::new(key, value, Some(head), Predecessor::Head));
                self.arena[head].set_back(Predecessor::Node(node));
                self.record_head(version, node);
            }
            Placement::Update { node } => {
                self.apply_change(node, FieldChange::Value(value), version);
            }
            Placement::Splice {
                predecessor,
                successor,
            } => {
                let node = self.arena.push(VersionedNode::new(
                    key,
                    value,
                    successor,
                    Predecessor::Node(predecessor),
                ));
                if let Some(successor) = successor {
                    self.arena[successor].set_back(Predecessor::Node(node));
                }
                self.apply_change(predecessor, FieldChange::Next(Some(node)), version);
            }
        }
        Ok(version)
    }

    /// Returns the value stored under `key` as of `version`.
    ///
    /// The key may be any borrowed form of the map's key type, but the
    /// ordering on the borrowed form must match the ordering on the key type.
    ///
    /// # Errors
    ///
    /// - [`PersistentMapError::VersionOutOfRange`] if `version` precedes the
    ///   first insertion.
    /// - [`PersistentMapError::KeyNotFound`] if `key` had no entry then.
    pub fn get<Q>(&self, key: &Q, version: Version) -> Result<&V, PersistentMapError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.snapshot(version)?
            .get(key)
            .ok_or(PersistentMapError::KeyNotFound)
    }

    /// Returns the value stored under `key` in the latest version.
    #[must_use]
    pub fn get_latest<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.latest().and_then(|snapshot| snapshot.get(key))
    }

    /// Returns `true` if `key` had an entry as of `version`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q, version: Version) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key, version).is_ok()
    }

    /// Finds where `key` lands in the latest chain.
    fn locate(&self, key: &K) -> Placement {
        let Some((_, &head)) = self.heads.last_key_value() else {
            return Placement::Empty;
        };
        if *key < *self.arena[head].key() {
            return Placement::NewHead { head };
        }

        let mut current = head;
        loop {
            let node = &self.arena[current];
            if node.key() == key {
                return Placement::Update { node: current };
            }
            match node.next_at(self.version) {
                Some(next) if *key >= *self.arena[next].key() => current = next,
                successor => {
                    return Placement::Splice {
                        predecessor: current,
                        successor,
                    };
                }
            }
        }
    }

    /// Upper bound on the nodes an insertion at `placement` allocates.
    fn planned_allocations(&self, placement: Placement) -> usize {
        match placement {
            Placement::Empty | Placement::NewHead { .. } => 1,
            Placement::Update { node } => self.cascade_length(node, FieldKind::Value),
            Placement::Splice { predecessor, .. } => {
                1 + self.cascade_length(predecessor, FieldKind::Next)
            }
        }
    }

    /// Counts the full nodes a change to `start` would rebuild.
    fn cascade_length(&self, start: NodeIndex, kind: FieldKind) -> usize {
        let budget = self.config.budget;
        let mut target = start;
        let mut kind = kind;
        let mut length = 0;
        loop {
            let node = &self.arena[target];
            if node.has_room_for(kind, budget) {
                return length;
            }
            length += 1;
            match node.back() {
                Predecessor::Head => return length,
                Predecessor::Node(predecessor) => {
                    target = predecessor;
                    kind = FieldKind::Next;
                }
            }
        }
    }

    /// Applies `change` to `target` at `version`, rebuilding full nodes and
    /// relinking their predecessors until some node has room.
    fn apply_change(&mut self, target: NodeIndex, change: FieldChange<V>, version: Version) {
        let budget = self.config.budget;
        let mut target = target;
        let mut change = change;
        loop {
            let node = &mut self.arena[target];
            if node.has_room_for(change.kind(), budget) {
                trace!(
                    version = %version,
                    node = target.get(),
                    field = ?change.kind(),
                    "recorded in-place modification"
                );
                node.record(change, version);
                return;
            }

            let replacement = node.rebuilt_with(change);
            let successor = replacement.latest_next();
            let predecessor = replacement.back();
            let copy = self.arena.push(replacement);
            self.rebuilds += 1;
            debug!(
                version = %version,
                retired = target.get(),
                replacement = copy.get(),
                "rebuilt full node"
            );

            if let Some(successor) = successor {
                self.arena[successor].set_back(Predecessor::Node(copy));
            }
            match predecessor {
                Predecessor::Node(predecessor) => {
                    target = predecessor;
                    change = FieldChange::Next(Some(copy));
                }
                Predecessor::Head => {
                    self.record_head(version, copy);
                    return;
                }
            }
        }
    }
}

impl<K: Ord + Clone, V: Clone + Default> PersistentOrderedMap<K, V> {
    /// Returns the value stored under `key` as of `version`, or
    /// `V::default()` if there is none.
    ///
    /// A missing key, a version before the first insertion, and a stored
    /// value equal to the default are indistinguishable here; use
    /// [`get`](Self::get) to tell them apart.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fatmap::persistent::{PersistentOrderedMap, Version};
    ///
    /// let mut map = PersistentOrderedMap::new();
    /// let version = map.insert(1, 10);
    /// map.insert(2, 0);
    ///
    /// assert_eq!(map.search(&1, version), 10);
    /// assert_eq!(map.search(&2, version), 0); // not there yet
    /// assert_eq!(map.search(&1, Version::INITIAL), 0);
    /// ```
    #[must_use]
    pub fn search<Q>(&self, key: &Q, version: Version) -> V
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key, version).cloned().unwrap_or_default()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for PersistentOrderedMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a map by inserting each pair in turn, one version per pair.
impl<K: Ord + Clone, V: Clone> FromIterator<(K, V)> for PersistentOrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord + Clone, V: Clone> Extend<(K, V)> for PersistentOrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentOrderedMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = formatter.debug_struct("PersistentOrderedMap");
        debug.field("version", &self.version);
        match self.latest() {
            Some(snapshot) => debug.field("entries", &snapshot),
            None => debug.field("entries", &format_args!("{{}}")),
        };
        debug.finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for PersistentOrderedMap<K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.latest() {
            Some(snapshot) => serde::Serialize::serialize(&snapshot, serializer),
            None => serializer.collect_map(std::iter::empty::<(&K, &V)>()),
        }
    }
}

#[cfg(feature = "serde")]
struct PersistentOrderedMapVisitor<K, V> {
    key_marker: std::marker::PhantomData<K>,
    value_marker: std::marker::PhantomData<V>,
}

#[cfg(feature = "serde")]
impl<K, V> PersistentOrderedMapVisitor<K, V> {
    const fn new() -> Self {
        Self {
            key_marker: std::marker::PhantomData,
            value_marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for PersistentOrderedMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Ord + Clone,
    V: serde::Deserialize<'de> + Clone,
{
    type Value = PersistentOrderedMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        // Each entry becomes its own version, in input order.
        let mut map = PersistentOrderedMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map.try_insert(key, value)
                .map_err(<A::Error as serde::de::Error>::custom)?;
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for PersistentOrderedMap<K, V>
where
    K: serde::Deserialize<'de> + Ord + Clone,
    V: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentOrderedMapVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================
