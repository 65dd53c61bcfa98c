//! Backend trait definitions.

use crate::error::StorageResult;
use crate::range::{Direction, KeyRange};

/// A raw key-value pair as stored by a backend.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// A forward-only cursor over a key range.
///
/// Dropping the iterator releases whatever the backend holds for it,
/// whether or not it was fully drained.
pub type KvIter<'a> = Box<dyn Iterator<Item = StorageResult<KvPair>> + 'a>;

/// One change in a write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Store `value` under `key`.
    Set {
        /// The key.
        key: Vec<u8>,
        /// The new value.
        value: Vec<u8>,
    },
    /// Remove `key`.
    Delete {
        /// The key.
        key: Vec<u8>,
    },
}

impl WriteOp {
    /// Creates a set operation.
    #[must_use]
    pub fn set(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a delete operation.
    #[must_use]
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self::Delete { key: key.into() }
    }

    /// Returns the key the operation touches.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Set { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Read-only view of an ordered key-value store.
///
/// # Invariants
///
/// - `get` returns exactly the bytes last passed to `set` for that key
/// - `iter` yields keys in bytewise order (or reverse order)
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait ReadBackend: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or an I/O error occurs.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Returns true if a value is stored under `key`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ReadBackend::get`].
    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Opens a cursor over every entry whose key falls in `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot be opened.
    fn iter(&self, range: &KeyRange, direction: Direction) -> StorageResult<KvIter<'_>>;
}

/// Mutable view of an ordered key-value store.
///
/// Mutating methods take `&mut self`: at most one write is in flight on a
/// given view at a time.
pub trait Backend: ReadBackend {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or an I/O error occurs.
    fn set(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or an I/O error occurs.
    fn delete(&mut self, key: &[u8]) -> StorageResult<()>;

    /// Applies a batch of operations in order.
    ///
    /// [`super::InMemoryBackend`] and [`super::FileBackend`] apply a batch
    /// atomically: on error none of its operations is visible, and after a
    /// crash the file backend replays either all of them or none. The
    /// default applies each operation in turn and stops at the first error.
    ///
    /// # Errors
    ///
    /// Returns an error if any key is empty or an I/O error occurs.
    fn apply(&mut self, ops: &[WriteOp]) -> StorageResult<()> {
        for op in ops {
            match op {
                WriteOp::Set { key, value } => self.set(key, value)?,
                WriteOp::Delete { key } => self.delete(key)?,
            }
        }
        Ok(())
    }

    /// Flushes pending writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }
}
