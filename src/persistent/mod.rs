//! Partially persistent data structures.
//!
//! This module provides an ordered map whose every past version stays
//! readable after later insertions:
//!
//! - [`PersistentOrderedMap`]: versioned ordered map built on fat nodes
//! - [`Snapshot`]: read-only view of one version
//! - [`Version`]: name of a point in a map's history
//!
//! # Fat Nodes
//!
//! Rather than copying a path of nodes on every change, each node records
//! a couple of version-tagged modifications in place. Only when a node runs
//! out of room is it copied, and the copy is linked in by modifying its
//! predecessor in turn. The number of copies per insertion is amortized
//! O(1), and no version ever sees a node change under it.
//!
//! # Examples
//!
//! ```rust
//! use fatmap::persistent::PersistentOrderedMap;
//!
//! let mut map = PersistentOrderedMap::new();
//! map.insert("b", 2);
//! let before = map.insert("a", 1);
//! map.insert("a", 100);
//!
//! // Past versions are unaffected by later insertions
//! assert_eq!(map.get(&"a", before), Ok(&1));
//! assert_eq!(map.get_latest(&"a"), Some(&100));
//!
//! // Each version can be walked in key order
//! let keys: Vec<&&str> = map.snapshot(before).unwrap().keys().collect();
//! assert_eq!(keys, vec![&"a", &"b"]);
//! ```

mod arena;
mod node;
mod ordered_map;
mod snapshot;
mod version;

pub use ordered_map::MapStatistics;
pub use ordered_map::PersistentOrderedMap;
pub use snapshot::Snapshot;
pub use snapshot::SnapshotIterator;
pub use version::Version;

// Nodes link by arena index, so maps are plain owned data.
static_assertions::assert_impl_all!(PersistentOrderedMap<i32, String>: Send, Sync, Clone);
static_assertions::assert_impl_all!(Snapshot<'static, i32, String>: Send, Sync, Copy);
static_assertions::assert_impl_all!(Version: Send, Sync, Copy, Ord);
