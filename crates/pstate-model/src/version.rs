//! Schema version ordinals

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Ordinal schema version of a kind's stored state, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(u32);

impl SchemaVersion {
    /// The first version of every kind
    pub const INITIAL: Self = Self(1);

    /// Create a version
    #[inline]
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    /// Raw ordinal
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The version immediately after this one
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Versions in the half-open range `(from, to]`, ascending
    ///
    /// Empty when `from >= to`.
    pub fn range_after(from: Self, to: Self) -> impl Iterator<Item = Self> {
        (from.0.saturating_add(1)..=to.0)
            .filter(move |_| from < to)
            .map(Self)
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl Display for SchemaVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SchemaVersion {
    fn from(version: u32) -> Self {
        Self(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_after_is_half_open() {
        let versions: Vec<u32> = SchemaVersion::range_after(SchemaVersion::new(1), SchemaVersion::new(4))
            .map(SchemaVersion::get)
            .collect();
        assert_eq!(versions, vec![2, 3, 4]);
    }

    #[test]
    fn range_after_empty_when_not_ascending() {
        assert_eq!(
            SchemaVersion::range_after(SchemaVersion::new(3), SchemaVersion::new(3)).count(),
            0
        );
        assert_eq!(
            SchemaVersion::range_after(SchemaVersion::new(5), SchemaVersion::new(2)).count(),
            0
        );
    }

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&SchemaVersion::new(5)).unwrap(), "5");
        assert_eq!(SchemaVersion::default(), SchemaVersion::INITIAL);
    }
}
