//! Tables and their indexes.
//!
//! A [`Table`] owns the primary index and the secondary indexes of one record
//! type. All writes go through [`Table::save`] and [`Table::delete`], which
//! hand the primary entry and its secondary entries to the backend as one
//! [`WriteOp`] batch.

mod def;
mod index;

pub use def::TableDef;
pub use index::Index;

use crate::error::{OrmError, OrmResult};
use crate::field_names::FieldNames;
use crate::record::Record;
use crate::types::TableId;
use ormkv_codec::{decode_record, encode_key, encode_record, Value};
use ormkv_storage::{Backend, ReadBackend, WriteOp};
use std::fmt;
use tracing::debug;

/// How [`Table::save`] treats an existing record with the same primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// Overwrite if present, create otherwise.
    #[default]
    Upsert,
    /// Fail with `AlreadyExists` if present.
    Insert,
    /// Fail with `NotFound` if absent.
    Update,
}

impl fmt::Display for SaveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upsert => f.write_str("upsert"),
            Self::Insert => f.write_str("insert"),
            Self::Update => f.write_str("update"),
        }
    }
}

/// The storage mapping for one record type.
#[derive(Debug, Clone)]
pub struct Table {
    id: TableId,
    type_name: &'static str,
    primary: Index,
    indexes: Vec<Index>,
    strict_delete: bool,
    default_list_limit: Option<usize>,
}

impl Table {
    /// Returns the table ID.
    #[must_use]
    pub const fn id(&self) -> TableId {
        self.id
    }

    /// Returns the record type tag.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the primary index.
    #[must_use]
    pub const fn primary(&self) -> &Index {
        &self.primary
    }

    /// Returns the secondary indexes in declaration order.
    #[must_use]
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Returns true if deleting a missing record fails.
    #[must_use]
    pub const fn strict_delete(&self) -> bool {
        self.strict_delete
    }

    /// Returns the limit applied to list scans that set none.
    #[must_use]
    pub const fn default_list_limit(&self) -> Option<usize> {
        self.default_list_limit
    }

    /// Returns the unique index (primary included) over exactly `fields`.
    #[must_use]
    pub fn unique_index(&self, fields: &FieldNames) -> Option<&Index> {
        self.all_indexes()
            .find(|index| index.is_unique() && index.fields().same_set(fields))
    }

    /// Returns the index of any kind over exactly `fields`.
    #[must_use]
    pub fn index(&self, fields: &FieldNames) -> Option<&Index> {
        self.all_indexes()
            .find(|index| index.fields().same_set(fields))
    }

    fn all_indexes(&self) -> impl Iterator<Item = &Index> {
        std::iter::once(&self.primary).chain(&self.indexes)
    }

    /// Extracts the primary key values of a record.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` or `ValueKindMismatch` if the record does not
    /// produce a well-typed value for every key field.
    pub fn primary_key_values<R: Record>(&self, record: &R) -> OrmResult<Vec<Value>> {
        self.primary.values_of(record)
    }

    pub(crate) fn ensure_type<R: Record>(&self) -> OrmResult<()> {
        if R::TYPE_NAME == self.type_name {
            Ok(())
        } else {
            Err(OrmError::table_not_found(R::TYPE_NAME))
        }
    }

    /// Writes a record and maintains its secondary index entries.
    ///
    /// Every unique secondary index is checked for a conflicting owner before
    /// anything is written. The primary entry, the removal of stale secondary
    /// entries and the new secondary entries go to [`Backend::apply`] as one
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` or `NotFound` according to `mode`,
    /// `UniqueKeyViolation` on a unique index conflict, and any codec or
    /// backend error unchanged.
    pub fn save<B: Backend + ?Sized, R: Record>(
        &self,
        backend: &mut B,
        record: &R,
        mode: SaveMode,
    ) -> OrmResult<()> {
        self.ensure_type::<R>()?;
        let pk_values = self.primary.values_of(record)?;
        let pk_key = encode_key(&pk_values);
        let primary_key = self.primary.primary_entry_key(&pk_key);

        let existing: Option<R> = match backend.get(&primary_key)? {
            Some(body) => Some(decode_record(&body)?),
            None => None,
        };
        match (mode, existing.is_some()) {
            (SaveMode::Insert, true) => {
                return Err(OrmError::AlreadyExists {
                    type_name: self.type_name.to_string(),
                    key: self.primary.render(&pk_values),
                });
            }
            (SaveMode::Update, false) => return Err(self.not_found(&pk_values)),
            _ => {}
        }

        let mut entries = Vec::with_capacity(self.indexes.len());
        for index in &self.indexes {
            let values = index.values_of(record)?;
            let entry = index.entry(&values, &pk_key);
            if index.is_unique() {
                if let Some(owner) = backend.get(&entry.0)? {
                    if owner != pk_key {
                        return Err(OrmError::UniqueKeyViolation {
                            type_name: self.type_name.to_string(),
                            index: index.fields().to_string(),
                            key: index.render(&values),
                        });
                    }
                }
            }
            entries.push(entry);
        }

        let stale = match &existing {
            Some(previous) => self.secondary_keys(previous, &pk_key)?,
            None => Vec::new(),
        };

        let mut ops = Vec::with_capacity(1 + stale.len() + entries.len());
        ops.push(WriteOp::set(primary_key, encode_record(record)?));
        for key in stale {
            if !entries.iter().any(|(new_key, _)| *new_key == key) {
                ops.push(WriteOp::delete(key));
            }
        }
        ops.extend(entries.into_iter().map(|(key, value)| WriteOp::set(key, value)));
        backend.apply(&ops)?;

        debug!(
            table = self.type_name,
            %mode,
            key = %self.primary.render(&pk_values),
            replaced = existing.is_some(),
            "saved record"
        );
        Ok(())
    }

    /// Removes a record and all of its secondary index entries.
    ///
    /// Only the primary key of `record` is used; the secondary entries are
    /// computed from the stored version and removed in the same batch as the
    /// primary entry. Deleting a missing record is a no-op unless the table
    /// is strict.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing record on a strict table, and any
    /// codec or backend error unchanged.
    pub fn delete<B: Backend + ?Sized, R: Record>(
        &self,
        backend: &mut B,
        record: &R,
    ) -> OrmResult<()> {
        self.ensure_type::<R>()?;
        let pk_values = self.primary.values_of(record)?;
        let pk_key = encode_key(&pk_values);
        let primary_key = self.primary.primary_entry_key(&pk_key);

        let Some(body) = backend.get(&primary_key)? else {
            if self.strict_delete {
                return Err(self.not_found(&pk_values));
            }
            debug!(
                table = self.type_name,
                key = %self.primary.render(&pk_values),
                "delete of missing record ignored"
            );
            return Ok(());
        };

        let stored: R = decode_record(&body)?;
        let mut ops: Vec<WriteOp> = self
            .secondary_keys(&stored, &pk_key)?
            .into_iter()
            .map(WriteOp::delete)
            .collect();
        ops.push(WriteOp::delete(primary_key));
        backend.apply(&ops)?;

        debug!(
            table = self.type_name,
            key = %self.primary.render(&pk_values),
            "deleted record"
        );
        Ok(())
    }

    /// Loads a record by its encoded primary key.
    pub(crate) fn load<R: Record, B: ReadBackend + ?Sized>(
        &self,
        backend: &B,
        pk_key: &[u8],
    ) -> OrmResult<Option<R>> {
        match backend.get(&self.primary.primary_entry_key(pk_key))? {
            Some(body) => Ok(Some(decode_record(&body)?)),
            None => Ok(None),
        }
    }

    fn secondary_keys<R: Record>(&self, record: &R, pk_key: &[u8]) -> OrmResult<Vec<Vec<u8>>> {
        self.indexes
            .iter()
            .map(|index| Ok(index.entry(&index.values_of(record)?, pk_key).0))
            .collect()
    }

    fn not_found(&self, pk_values: &[Value]) -> OrmError {
        OrmError::NotFound {
            type_name: self.type_name.to_string(),
            key: self.primary.render(pk_values),
        }
    }
}
