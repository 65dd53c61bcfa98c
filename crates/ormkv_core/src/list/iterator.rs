//! Lazy record and key iterators.

use super::options::Cursor;
use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::table::{Index, Table};
use ormkv_codec::{decode_record, Value};
use ormkv_storage::{KvIter, KvPair, ReadBackend};
use tracing::trace;

/// Offset and limit bookkeeping.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pager {
    skip: usize,
    remaining: Option<usize>,
}

impl Pager {
    pub(crate) const fn new(offset: usize, limit: Option<usize>) -> Self {
        Self {
            skip: offset,
            remaining: limit,
        }
    }

    const fn is_done(&self) -> bool {
        matches!(self.remaining, Some(0))
    }

    /// Counts one matching item; false while it is still being skipped.
    fn admit(&mut self) -> bool {
        if self.skip > 0 {
            self.skip -= 1;
            return false;
        }
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        true
    }
}

/// A backend cursor over one index, released as soon as the scan ends.
pub(crate) struct Scan<'a> {
    index: &'a Index,
    kv: Option<KvIter<'a>>,
    pager: Pager,
    cursor: Option<Cursor>,
}

impl<'a> Scan<'a> {
    pub(crate) fn new(index: &'a Index, kv: KvIter<'a>, pager: Pager) -> Self {
        Self {
            index,
            kv: Some(kv),
            pager,
            cursor: None,
        }
    }

    fn next_entry(&mut self) -> Option<OrmResult<KvPair>> {
        if self.pager.is_done() {
            self.close();
            return None;
        }
        match self.kv.as_mut()?.next() {
            Some(Ok(pair)) => Some(Ok(pair)),
            Some(Err(err)) => {
                self.close();
                Some(Err(err.into()))
            }
            None => {
                self.close();
                None
            }
        }
    }

    /// Records `key` as returned unless the offset still skips it.
    fn accept(&mut self, key: Vec<u8>) -> bool {
        if !self.pager.admit() {
            return false;
        }
        self.cursor = Some(Cursor::from_bytes(key));
        if self.pager.is_done() {
            self.close();
        }
        true
    }

    fn close(&mut self) {
        if self.kv.take().is_some() {
            trace!(index = %self.index.fields(), "released list cursor");
        }
    }
}

/// A lazily produced, forward-only sequence of records.
///
/// The underlying backend cursor is held until the scan is exhausted, hits
/// its limit, fails, or the iterator is closed or dropped.
pub struct RecordIterator<'a, R, B: ?Sized> {
    backend: &'a B,
    table: &'a Table,
    scan: Scan<'a>,
    filter: Option<Box<dyn Fn(&R) -> bool>>,
}

impl<'a, R: Record, B: ReadBackend + ?Sized> RecordIterator<'a, R, B> {
    pub(crate) fn new(
        backend: &'a B,
        table: &'a Table,
        scan: Scan<'a>,
        filter: Option<Box<dyn Fn(&R) -> bool>>,
    ) -> Self {
        Self {
            backend,
            table,
            scan,
            filter,
        }
    }

    /// Returns the position of the last record returned.
    #[must_use]
    pub fn cursor(&self) -> Option<&Cursor> {
        self.scan.cursor.as_ref()
    }

    /// Returns true while the backend cursor is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.scan.kv.is_some()
    }

    /// Releases the backend cursor. Later calls to `next` return `None`.
    pub fn close(&mut self) {
        self.scan.close();
    }

    /// Switches to yielding primary key values without decoding records.
    ///
    /// # Errors
    ///
    /// Returns `InvalidListOptions` if a filter is set, since filters need
    /// the decoded record.
    pub fn into_keys(self) -> OrmResult<KeyIterator<'a>> {
        if self.filter.is_some() {
            return Err(OrmError::invalid_list_options(
                "a filtered list cannot yield keys",
            ));
        }
        Ok(KeyIterator { scan: self.scan })
    }

    /// Drains the iterator into a [`Page`].
    ///
    /// # Errors
    ///
    /// Returns the first error the scan produces.
    pub fn collect_page(mut self) -> OrmResult<Page<R>> {
        let mut records = Vec::new();
        for record in self.by_ref() {
            records.push(record?);
        }
        let next_cursor = if self.scan.pager.is_done() {
            self.scan.cursor.take()
        } else {
            None
        };
        Ok(Page {
            records,
            next_cursor,
        })
    }

    fn load(&self, key: &[u8], value: &[u8]) -> OrmResult<R> {
        let index = self.scan.index;
        if index.is_primary() {
            return Ok(decode_record(value)?);
        }
        let pk_key = index.pk_key_of(key, value)?;
        self.table
            .load(self.backend, &pk_key)?
            .ok_or_else(|| index.inconsistent())
    }
}

impl<R: Record, B: ReadBackend + ?Sized> Iterator for RecordIterator<'_, R, B> {
    type Item = OrmResult<R>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (key, value) = match self.scan.next_entry()? {
                Ok(pair) => pair,
                Err(err) => return Some(Err(err)),
            };
            let record = match self.load(&key, &value) {
                Ok(record) => record,
                Err(err) => {
                    self.scan.close();
                    return Some(Err(err));
                }
            };
            if let Some(filter) = &self.filter {
                if !filter(&record) {
                    continue;
                }
            }
            if self.scan.accept(key) {
                return Some(Ok(record));
            }
        }
    }
}

/// Primary key values of the records a scan visits.
pub struct KeyIterator<'a> {
    scan: Scan<'a>,
}

impl KeyIterator<'_> {
    /// Returns the position of the last key returned.
    #[must_use]
    pub fn cursor(&self) -> Option<&Cursor> {
        self.scan.cursor.as_ref()
    }

    /// Returns true while the backend cursor is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.scan.kv.is_some()
    }
}

impl Iterator for KeyIterator<'_> {
    type Item = OrmResult<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (key, value) = match self.scan.next_entry()? {
                Ok(pair) => pair,
                Err(err) => return Some(Err(err)),
            };
            let pk_values = match self.scan.index.pk_values_of(&key, &value) {
                Ok(values) => values,
                Err(err) => {
                    self.scan.close();
                    return Some(Err(err));
                }
            };
            if self.scan.accept(key) {
                return Some(Ok(pk_values));
            }
        }
    }
}

/// One page of a paginated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<R> {
    /// The records of this page.
    pub records: Vec<R>,
    /// Where the next page starts. `None` once the scan is exhausted; when
    /// the page ended on its limit exactly, the next page may be empty.
    pub next_cursor: Option<Cursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pager_skips_then_counts() {
        let mut pager = Pager::new(2, Some(2));
        assert!(!pager.admit());
        assert!(!pager.admit());
        assert!(!pager.is_done());
        assert!(pager.admit());
        assert!(pager.admit());
        assert!(pager.is_done());
    }

    #[test]
    fn unlimited_pager_never_finishes() {
        let mut pager = Pager::new(0, None);
        for _ in 0..100 {
            assert!(pager.admit());
        }
        assert!(!pager.is_done());
    }
}
