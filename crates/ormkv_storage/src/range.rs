//! Key ranges and scan direction.

use crate::backend::KvPair;
use crate::error::StorageResult;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scan order for [`crate::ReadBackend::iter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending key order.
    #[default]
    Forward,
    /// Descending key order.
    Reverse,
}

/// A range of raw keys.
///
/// Bounds compare bytewise, the same order the backends keep keys in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    start: Bound<Vec<u8>>,
    end: Bound<Vec<u8>>,
}

impl KeyRange {
    /// Creates a range from explicit bounds.
    #[must_use]
    pub const fn new(start: Bound<Vec<u8>>, end: Bound<Vec<u8>>) -> Self {
        Self { start, end }
    }

    /// The range covering every key.
    #[must_use]
    pub const fn all() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// The range of keys starting with `prefix`.
    #[must_use]
    pub fn prefix(prefix: &[u8]) -> Self {
        let end = match prefix_successor(prefix) {
            Some(successor) => Bound::Excluded(successor),
            None => Bound::Unbounded,
        };
        Self::new(Bound::Included(prefix.to_vec()), end)
    }

    /// Inclusive start, exclusive end.
    #[must_use]
    pub fn between(start: Vec<u8>, end: Vec<u8>) -> Self {
        Self::new(Bound::Included(start), Bound::Excluded(end))
    }

    /// Returns the lower bound.
    #[must_use]
    pub const fn start(&self) -> &Bound<Vec<u8>> {
        &self.start
    }

    /// Returns the upper bound.
    #[must_use]
    pub const fn end(&self) -> &Bound<Vec<u8>> {
        &self.end
    }

    /// Returns a copy of this range with a different lower bound.
    #[must_use]
    pub fn with_start(&self, start: Bound<Vec<u8>>) -> Self {
        Self::new(start, self.end.clone())
    }

    /// Returns a copy of this range with a different upper bound.
    #[must_use]
    pub fn with_end(&self, end: Bound<Vec<u8>>) -> Self {
        Self::new(self.start.clone(), end)
    }

    /// Returns true if `key` falls inside the range.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        let above_start = match &self.start {
            Bound::Included(s) => key >= s.as_slice(),
            Bound::Excluded(s) => key > s.as_slice(),
            Bound::Unbounded => true,
        };
        let below_end = match &self.end {
            Bound::Included(e) => key <= e.as_slice(),
            Bound::Excluded(e) => key < e.as_slice(),
            Bound::Unbounded => true,
        };
        above_start && below_end
    }

    /// Returns true if no key can fall inside the range.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Bound::Included(s), Bound::Included(e)) => s > e,
            (Bound::Included(s) | Bound::Excluded(s), Bound::Excluded(e))
            | (Bound::Excluded(s), Bound::Included(e)) => s >= e,
            _ => false,
        }
    }
}

/// Returns the smallest key greater than every key starting with `prefix`.
///
/// `None` when the prefix is empty or all `0xFF`.
#[must_use]
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut successor = prefix.to_vec();
    while let Some(last) = successor.pop() {
        if last < u8::MAX {
            successor.push(last + 1);
            return Some(successor);
        }
    }
    None
}

/// Copies the entries of `map` inside `range` in the requested order.
pub(crate) fn snapshot(
    map: &BTreeMap<Vec<u8>, Vec<u8>>,
    range: &KeyRange,
    direction: Direction,
) -> Vec<KvPair> {
    if range.is_empty() {
        return Vec::new();
    }
    let entries = map.range::<Vec<u8>, _>((range.start.clone(), range.end.clone()));
    match direction {
        Direction::Forward => entries.map(|(k, v)| (k.clone(), v.clone())).collect(),
        Direction::Reverse => entries
            .rev()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

/// Cursor over a copied range, tracked by an open-iterator gauge.
pub(crate) struct SnapshotIter {
    entries: std::vec::IntoIter<KvPair>,
    open: Arc<AtomicUsize>,
}

impl SnapshotIter {
    pub(crate) fn new(entries: Vec<KvPair>, open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self {
            entries: entries.into_iter(),
            open: Arc::clone(open),
        }
    }
}

impl Iterator for SnapshotIter {
    type Item = StorageResult<KvPair>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl Drop for SnapshotIter {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
