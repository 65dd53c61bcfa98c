//! Range scans over tables.
//!
//! [`iterator`] turns [`ListOptions`] into a key range on one index and opens
//! a backend cursor over it. Records are decoded lazily as the returned
//! [`RecordIterator`] is advanced; nothing is buffered.

mod iterator;
mod options;

pub use iterator::{KeyIterator, Page, RecordIterator};
pub use options::{Cursor, ListOptions};

use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::table::{Index, Table};
use iterator::{Pager, Scan};
use ormkv_codec::Value;
use ormkv_storage::{Direction, KeyRange, ReadBackend};
use std::ops::Bound;
use tracing::trace;

/// Opens a scan over `table` in `backend`.
///
/// # Errors
///
/// Returns `IndexNotFound` if the options name an index the table does not
/// have, `InvalidListOptions` if the bounds are contradictory or do not fit
/// the index, and any backend error raised while opening the cursor.
pub fn iterator<'a, R: Record, B: ReadBackend + ?Sized>(
    backend: &'a B,
    table: &'a Table,
    options: ListOptions<R>,
) -> OrmResult<RecordIterator<'a, R, B>> {
    table.ensure_type::<R>()?;
    let index = match &options.index {
        Some(fields) => table
            .index(fields)
            .ok_or_else(|| OrmError::index_not_found(table.type_name(), fields))?,
        None => table.primary(),
    };

    let range = scan_range(index, &options)?;
    let direction = if options.reverse {
        Direction::Reverse
    } else {
        Direction::Forward
    };
    let limit = options.limit.or(table.default_list_limit());
    trace!(
        table = table.type_name(),
        index = %index.fields(),
        ?direction,
        ?limit,
        offset = options.offset,
        "opening list cursor"
    );

    let kv = backend.iter(&range, direction)?;
    let scan = Scan::new(index, kv, Pager::new(options.offset, limit));
    Ok(RecordIterator::new(backend, table, scan, options.filter))
}

fn scan_range<R>(index: &Index, options: &ListOptions<R>) -> OrmResult<KeyRange> {
    let mut range = match &options.prefix {
        Some(values) => {
            if options.start.is_some() || options.end.is_some() {
                return Err(OrmError::invalid_list_options(
                    "prefix cannot be combined with start or end",
                ));
            }
            KeyRange::prefix(&bound_key(index, values)?)
        }
        None => {
            let mut range = KeyRange::prefix(index.prefix());
            if let Some(values) = &options.start {
                range = range.with_start(Bound::Included(bound_key(index, values)?));
            }
            if let Some(values) = &options.end {
                range = range.with_end(Bound::Excluded(bound_key(index, values)?));
            }
            range
        }
    };

    if let Some(cursor) = &options.cursor {
        if !range.contains(cursor.as_bytes()) {
            return Err(OrmError::invalid_list_options(
                "cursor lies outside the scanned range",
            ));
        }
        let after = Bound::Excluded(cursor.as_bytes().to_vec());
        range = if options.reverse {
            range.with_end(after)
        } else {
            range.with_start(after)
        };
    }
    Ok(range)
}

fn bound_key(index: &Index, values: &[Value]) -> OrmResult<Vec<u8>> {
    index
        .check_leading(values)
        .map_err(|err| OrmError::invalid_list_options(err.to_string()))?;
    Ok(index.key_for(values))
}
