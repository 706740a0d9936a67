//! # fatmap
//!
//! A partially persistent ordered map for Rust.
//!
//! ## Overview
//!
//! Every insertion into a [`PersistentOrderedMap`](persistent::PersistentOrderedMap)
//! creates a new version, and every version ever created can still be
//! queried afterwards. Only the latest version accepts changes. The map is
//! built from fat nodes: each node carries a small bounded log of
//! version-tagged modifications and is rebuilt once that log is full.
//!
//! - **Persistent**: `PersistentOrderedMap`, `Snapshot`, `Version`
//! - **Configuration**: `MapConfig`, `ModificationBudget`
//! - **Errors**: `PersistentMapError`
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for maps, snapshots, versions and
//!   configuration
//!
//! ## Example
//!
//! ```rust
//! use fatmap::prelude::*;
//!
//! let mut map = PersistentOrderedMap::new();
//! for key in 0..10 {
//!     map.insert(key, key);
//! }
//! let checkpoint = map.current_version();
//!
//! map.insert(3, 300);
//!
//! assert_eq!(map.get(&3, checkpoint), Ok(&3));
//! assert_eq!(map.get_latest(&3), Some(&300));
//! assert_eq!(map.get(&42, checkpoint), Err(PersistentMapError::KeyNotFound));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types.
///
/// # Usage
///
/// ```rust
/// use fatmap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::persistent::*;
}

pub mod config;
pub mod error;
pub mod persistent;

pub use error::PersistentMapError;
