//! List options and cursors.

use crate::field_names::FieldNames;
use ormkv_codec::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a record within a scan.
///
/// Returned by [`super::RecordIterator::cursor`] and accepted by
/// [`ListOptions::cursor`] to resume a scan right after that record. A cursor
/// is only meaningful for the table, index and direction it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(Vec<u8>);

impl Cursor {
    /// Wraps raw cursor bytes, e.g. read back from a page token.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the raw cursor bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the cursor and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Options for [`super::iterator`].
///
/// By default every record of the table is returned in primary key order.
///
/// ```rust,ignore
/// let options = ListOptions::<Post>::new()
///     .index(FieldNames::parse("author")?)
///     .prefix(vec![Value::Unsigned(7)])
///     .reverse()
///     .limit(20);
/// ```
pub struct ListOptions<R> {
    pub(crate) index: Option<FieldNames>,
    pub(crate) prefix: Option<Vec<Value>>,
    pub(crate) start: Option<Vec<Value>>,
    pub(crate) end: Option<Vec<Value>>,
    pub(crate) reverse: bool,
    pub(crate) limit: Option<usize>,
    pub(crate) offset: usize,
    pub(crate) cursor: Option<Cursor>,
    pub(crate) filter: Option<Box<dyn Fn(&R) -> bool>>,
}

impl<R> ListOptions<R> {
    /// Creates options that scan the whole table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: None,
            prefix: None,
            start: None,
            end: None,
            reverse: false,
            limit: None,
            offset: 0,
            cursor: None,
            filter: None,
        }
    }

    /// Scans the index over `fields` instead of the primary key.
    #[must_use]
    pub fn index(mut self, fields: FieldNames) -> Self {
        self.index = Some(fields);
        self
    }

    /// Restricts the scan to entries whose leading index values equal
    /// `values`.
    #[must_use]
    pub fn prefix(mut self, values: Vec<Value>) -> Self {
        self.prefix = Some(values);
        self
    }

    /// Inclusive lower bound on the leading index values.
    #[must_use]
    pub fn start(mut self, values: Vec<Value>) -> Self {
        self.start = Some(values);
        self
    }

    /// Exclusive upper bound on the leading index values.
    #[must_use]
    pub fn end(mut self, values: Vec<Value>) -> Self {
        self.end = Some(values);
        self
    }

    /// Scans in descending key order.
    #[must_use]
    pub const fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Returns at most `limit` records.
    ///
    /// Without a limit the schema's `Config::default_list_limit` applies, if
    /// set.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` matching records.
    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Resumes right after the record at `cursor`.
    #[must_use]
    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Keeps only records for which `predicate` returns true.
    ///
    /// Records rejected by the filter count neither against the limit nor
    /// against the offset.
    #[must_use]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&R) -> bool + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }
}

impl<R> Default for ListOptions<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for ListOptions<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListOptions")
            .field("index", &self.index)
            .field("prefix", &self.prefix)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("reverse", &self.reverse)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("cursor", &self.cursor)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}
