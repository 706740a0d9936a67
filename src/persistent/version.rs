//! Version numbers naming points in a map's mutation history.

use std::fmt;

/// A point in the mutation history of a
/// [`PersistentOrderedMap`](super::PersistentOrderedMap).
///
/// Versions are handed out by the map, one per insertion, starting at
/// `v1`. [`Version::INITIAL`] (`v0`) names the state before the first
/// insertion, at which the map holds no entries.
///
/// # Examples
///
/// ```rust
/// use fatmap::persistent::Version;
///
/// let version = Version::INITIAL.next().next();
/// assert_eq!(version.get(), 2);
/// assert_eq!(version.to_string(), "v2");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Version(u64);

impl Version {
    /// The version of an empty map, before any insertion.
    pub const INITIAL: Self = Self(0);

    /// Creates a version from its raw number.
    #[inline]
    #[must_use]
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    /// Returns the raw version number.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the version immediately after this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "v{}", self.0)
    }
}

impl From<u64> for Version {
    #[inline]
    fn from(number: u64) -> Self {
        Self(number)
    }
}

impl From<Version> for u64 {
    #[inline]
    fn from(version: Version) -> Self {
        version.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_initial_is_zero() {
        assert_eq!(Version::INITIAL.get(), 0);
        assert_eq!(Version::default(), Version::INITIAL);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(9, 10)]
    #[case(41, 42)]
    fn test_next_advances_by_one(#[case] number: u64, #[case] expected: u64) {
        assert_eq!(Version::new(number).next().get(), expected);
    }

    #[rstest]
    fn test_ordering_follows_number() {
        assert!(Version::new(3) < Version::new(10));
        assert!(Version::INITIAL < Version::INITIAL.next());
    }

    #[rstest]
    fn test_display() {
        assert_eq!(format!("{}", Version::new(30)), "v30");
    }

    #[rstest]
    fn test_conversions() {
        let version: Version = 7_u64.into();
        let number: u64 = version.into();
        assert_eq!(number, 7);
    }
}
