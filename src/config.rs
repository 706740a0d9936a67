//! Construction-time configuration for versioned maps.
//!
//! A [`MapConfig`] is fixed for the lifetime of a
//! [`PersistentOrderedMap`](crate::persistent::PersistentOrderedMap); it is
//! chosen once through
//! [`with_config`](crate::persistent::PersistentOrderedMap::with_config).
//!
//! # Examples
//!
//! ```rust
//! use fatmap::config::{MapConfig, ModificationBudget};
//! use fatmap::persistent::PersistentOrderedMap;
//!
//! let config = MapConfig::default()
//!     .with_budget(ModificationBudget::PerField)
//!     .with_initial_node_capacity(128);
//!
//! let mut map: PersistentOrderedMap<u32, String> = PersistentOrderedMap::with_config(config);
//! map.insert(1, "one".to_string());
//! assert_eq!(map.config().budget, ModificationBudget::PerField);
//! ```

/// Number of in-place modifications a node absorbs before it must be rebuilt.
pub const MODIFICATION_CAPACITY: usize = 2;

/// How the [`MODIFICATION_CAPACITY`] slots of a node are split between its
/// value log and its next-pointer log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ModificationBudget {
    /// Both logs draw from one pool of `MODIFICATION_CAPACITY` slots.
    ///
    /// A node is full once the two logs together hold that many records.
    #[default]
    Shared,
    /// Each log has its own `MODIFICATION_CAPACITY` slots.
    ///
    /// A node is full for value updates once its value log is at capacity,
    /// and full for relinking once its next log is at capacity.
    PerField,
}

/// Configuration of a [`PersistentOrderedMap`](crate::persistent::PersistentOrderedMap).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MapConfig {
    /// Slot accounting used to decide when a node is full.
    pub budget: ModificationBudget,
    /// Number of nodes the arena reserves up front.
    pub initial_node_capacity: usize,
}

impl MapConfig {
    /// Creates the default configuration: shared budget, no pre-allocation.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            budget: ModificationBudget::Shared,
            initial_node_capacity: 0,
        }
    }

    /// Returns this configuration with the given modification budget.
    #[inline]
    #[must_use]
    pub const fn with_budget(mut self, budget: ModificationBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Returns this configuration with the given arena pre-allocation.
    #[inline]
    #[must_use]
    pub const fn with_initial_node_capacity(mut self, capacity: usize) -> Self {
        self.initial_node_capacity = capacity;
        self
    }
}
