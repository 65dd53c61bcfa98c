//! Core type definitions for ormkv.

use std::fmt;

/// Identifier for a table.
///
/// Table IDs are assigned by the schema author and namespace every key the
/// table writes. They must stay stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub u32);

impl TableId {
    /// Creates a new table ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table:{}", self.0)
    }
}

/// Identifier for an index within its table.
///
/// The primary index is always `0`; secondary indexes are numbered from `1`
/// in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexId(pub u16);

impl IndexId {
    /// The primary index.
    pub const PRIMARY: Self = Self(0);

    /// Creates a new index ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true for the primary index.
    #[must_use]
    pub const fn is_primary(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "idx:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_id_display() {
        assert_eq!(format!("{}", TableId::new(42)), "table:42");
    }

    #[test]
    fn index_id_primary() {
        assert!(IndexId::PRIMARY.is_primary());
        assert!(!IndexId::new(1).is_primary());
        assert_eq!(format!("{}", IndexId::new(3)), "idx:3");
    }
}
