//! In-memory storage backend for testing.

use crate::backend::{Backend, KvIter, ReadBackend, WriteOp};
use crate::error::{StorageError, StorageResult};
use crate::range::{self, Direction, KeyRange, SnapshotIter};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An in-memory ordered key-value backend.
///
/// This backend keeps all entries in a `BTreeMap` and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// Iterators copy the requested range when they are opened, so later writes
/// are not visible to an iterator that is already open. The number of
/// iterators currently alive is reported by [`InMemoryBackend::open_iterators`].
///
/// # Example
///
/// ```rust
/// use ormkv_storage::{Backend, InMemoryBackend, ReadBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.set(b"key", b"value").unwrap();
/// assert_eq!(backend.get(b"key").unwrap(), Some(b"value".to_vec()));
/// assert_eq!(backend.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    open_iterators: Arc<AtomicUsize>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend with pre-existing entries.
    #[must_use]
    pub fn with_entries(entries: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self {
            entries: RwLock::new(entries),
            open_iterators: Arc::default(),
        }
    }

    /// Returns a copy of all entries.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.entries.read().clone()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the number of iterators that have been opened and not dropped.
    #[must_use]
    pub fn open_iterators(&self) -> usize {
        self.open_iterators.load(Ordering::SeqCst)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.write().clear();
    }
}

impl ReadBackend for InMemoryBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        Ok(self.entries.read().get(key).cloned())
    }

    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        Ok(self.entries.read().contains_key(key))
    }

    fn iter(&self, range: &KeyRange, direction: Direction) -> StorageResult<KvIter<'_>> {
        let entries = range::snapshot(&self.entries.read(), range, direction);
        tracing::trace!(count = entries.len(), ?direction, "opened in-memory cursor");
        Ok(Box::new(SnapshotIter::new(entries, &self.open_iterators)))
    }
}

impl Backend for InMemoryBackend {
    fn set(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        self.entries.write().remove(key);
        Ok(())
    }

    fn apply(&mut self, ops: &[WriteOp]) -> StorageResult<()> {
        if ops.iter().any(|op| op.key().is_empty()) {
            return Err(StorageError::EmptyKey);
        }
        let mut entries = self.entries.write();
        for op in ops {
            match op {
                WriteOp::Set { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                WriteOp::Delete { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }
}
