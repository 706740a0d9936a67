//! Error type for versioned map operations.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::persistent::Version;

/// Errors returned by the fallible operations of
/// [`PersistentOrderedMap`](crate::persistent::PersistentOrderedMap).
///
/// The raw [`search`](crate::persistent::PersistentOrderedMap::search) lookup
/// never returns this type; it substitutes the value type's default instead.
///
/// # Examples
///
/// ```rust
/// use fatmap::PersistentMapError;
/// use fatmap::persistent::{PersistentOrderedMap, Version};
///
/// let mut map = PersistentOrderedMap::new();
/// let version = map.insert(1, "one");
///
/// assert_eq!(map.get(&2, version), Err(PersistentMapError::KeyNotFound));
/// assert_eq!(
///     map.get(&1, Version::INITIAL),
///     Err(PersistentMapError::VersionOutOfRange {
///         requested: Version::INITIAL,
///         earliest: Some(version),
///     })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PersistentMapError {
    /// The key has no entry in the requested version.
    #[error("key not found in the requested version")]
    KeyNotFound,

    /// The requested version precedes the first recorded version.
    ///
    /// `earliest` is `None` when the map holds no versions at all.
    #[error("version {requested} is out of range (earliest: {})", display_earliest(.earliest))]
    VersionOutOfRange {
        /// The version that was asked for.
        requested: Version,
        /// The first version the map can answer for, if any.
        earliest: Option<Version>,
    },

    /// The node arena could not grow.
    #[error("failed to allocate node storage: {0}")]
    AllocationFailure(#[from] TryReserveError),
}

#[allow(clippy::ref_option)]
fn display_earliest(earliest: &Option<Version>) -> String {
    earliest.map_or_else(|| "none".to_string(), |version| version.to_string())
}
