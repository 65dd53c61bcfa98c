//! Index access paths.

use crate::error::{OrmError, OrmResult};
use crate::field_names::FieldNames;
use crate::record::Record;
use crate::types::IndexId;
use ormkv_codec::{decode_key, decode_record, encode_key_into, KeyDecoder, Value, ValueKind};
use ormkv_storage::{Direction, KeyRange, ReadBackend};

/// An index over the records of one table.
///
/// Every table has a primary index (id `0`, always unique) whose entries hold
/// the record bodies. Secondary indexes map their field values back to the
/// primary key:
///
/// | Kind | Entry key | Entry value |
/// |---|---|---|
/// | primary | `prefix \| key(pk)` | record body |
/// | unique | `prefix \| key(values)` | `key(pk)` |
/// | non-unique | `prefix \| key(values) \| key(pk)` | empty |
#[derive(Debug, Clone)]
pub struct Index {
    id: IndexId,
    type_name: &'static str,
    fields: FieldNames,
    kinds: Vec<ValueKind>,
    unique: bool,
    prefix: Vec<u8>,
    primary_prefix: Vec<u8>,
}

impl Index {
    pub(crate) fn new(
        id: IndexId,
        type_name: &'static str,
        fields: FieldNames,
        kinds: Vec<ValueKind>,
        unique: bool,
        table_prefix: &[u8],
    ) -> Self {
        let mut prefix = table_prefix.to_vec();
        prefix.extend_from_slice(&id.as_u16().to_be_bytes());
        let mut primary_prefix = table_prefix.to_vec();
        primary_prefix.extend_from_slice(&IndexId::PRIMARY.as_u16().to_be_bytes());
        Self {
            id,
            type_name,
            fields,
            kinds,
            unique: unique || id.is_primary(),
            prefix,
            primary_prefix,
        }
    }

    /// Returns the index ID.
    #[must_use]
    pub const fn id(&self) -> IndexId {
        self.id
    }

    /// Returns the indexed fields in declared order.
    #[must_use]
    pub const fn fields(&self) -> &FieldNames {
        &self.fields
    }

    /// Returns the declared kinds of the indexed fields.
    #[must_use]
    pub fn kinds(&self) -> &[ValueKind] {
        &self.kinds
    }

    /// Returns true if the index holds at most one record per key.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns true for the primary index.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.id.is_primary()
    }

    /// Returns the key prefix shared by every entry of this index.
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Re-orders caller values from `requested` order to index order.
    ///
    /// `requested` must name the same fields as the index.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if the number of values differs from the number
    /// of requested fields, `IndexNotFound` if `requested` names other fields,
    /// and `ValueKindMismatch` if a value has the wrong kind.
    pub fn align(&self, requested: &FieldNames, values: &[Value]) -> OrmResult<Vec<Value>> {
        if values.len() != requested.len() {
            return Err(OrmError::ArityMismatch {
                fields: requested.to_string(),
                expected: requested.len(),
                actual: values.len(),
            });
        }
        if !self.fields.same_set(requested) {
            return Err(OrmError::index_not_found(self.type_name, requested));
        }
        let aligned: Vec<Value> = self
            .fields
            .iter()
            .filter_map(|name| requested.position(name))
            .map(|pos| values[pos].clone())
            .collect();
        self.check_values(&aligned)?;
        Ok(aligned)
    }

    /// Checks values given in index order.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` or `ValueKindMismatch`.
    pub fn check_values(&self, values: &[Value]) -> OrmResult<()> {
        if values.len() != self.fields.len() {
            return Err(self.arity_mismatch(values.len()));
        }
        self.check_leading(values)
    }

    /// Checks leading values given in index order. Fewer values than fields
    /// are accepted.
    pub(crate) fn check_leading(&self, values: &[Value]) -> OrmResult<()> {
        if values.len() > self.fields.len() {
            return Err(self.arity_mismatch(values.len()));
        }
        for ((name, expected), value) in self.fields.iter().zip(&self.kinds).zip(values) {
            if value.kind() != *expected {
                return Err(OrmError::ValueKindMismatch {
                    field: name.to_string(),
                    expected: *expected,
                    actual: value.kind(),
                });
            }
        }
        Ok(())
    }

    fn arity_mismatch(&self, actual: usize) -> OrmError {
        OrmError::ArityMismatch {
            fields: self.fields.to_string(),
            expected: self.fields.len(),
            actual,
        }
    }

    /// Looks up a record by values in index order.
    ///
    /// Returns `Ok(None)` when no record matches. On a non-unique index the
    /// first matching record in key order is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the values do not fit the index, the backend read
    /// fails, the body cannot be decoded, or a secondary entry points at a
    /// missing record.
    pub fn get<R: Record, B: ReadBackend + ?Sized>(
        &self,
        backend: &B,
        values: &[Value],
    ) -> OrmResult<Option<R>> {
        self.check_values(values)?;
        let key = self.key_for(values);

        if self.is_primary() {
            return match backend.get(&key)? {
                Some(body) => Ok(Some(decode_record(&body)?)),
                None => Ok(None),
            };
        }

        let pk_key = if self.unique {
            match backend.get(&key)? {
                Some(pk_key) => pk_key,
                None => return Ok(None),
            }
        } else {
            let mut entries = backend.iter(&KeyRange::prefix(&key), Direction::Forward)?;
            match entries.next() {
                Some(entry) => {
                    let (entry_key, entry_value) = entry?;
                    self.pk_key_of(&entry_key, &entry_value)?
                }
                None => return Ok(None),
            }
        };

        match backend.get(&self.primary_entry_key(&pk_key))? {
            Some(body) => Ok(Some(decode_record(&body)?)),
            None => Err(self.inconsistent()),
        }
    }

    /// Checks whether a record matches values in index order, without
    /// decoding it.
    ///
    /// # Errors
    ///
    /// Returns an error if the values do not fit the index or the backend
    /// read fails.
    pub fn has<B: ReadBackend + ?Sized>(&self, backend: &B, values: &[Value]) -> OrmResult<bool> {
        self.check_values(values)?;
        let key = self.key_for(values);
        if self.unique {
            return Ok(backend.has(&key)?);
        }
        let mut entries = backend.iter(&KeyRange::prefix(&key), Direction::Forward)?;
        match entries.next() {
            Some(entry) => entry.map(|_| true).map_err(OrmError::from),
            None => Ok(false),
        }
    }

    /// Extracts this index's values from a record.
    pub(crate) fn values_of<R: Record>(&self, record: &R) -> OrmResult<Vec<Value>> {
        let mut values = Vec::with_capacity(self.fields.len());
        for (name, expected) in self.fields.iter().zip(&self.kinds) {
            let value = record
                .field_value(name)
                .ok_or_else(|| OrmError::MissingField {
                    type_name: self.type_name.to_string(),
                    field: name.to_string(),
                })?;
            if value.kind() != *expected {
                return Err(OrmError::ValueKindMismatch {
                    field: name.to_string(),
                    expected: *expected,
                    actual: value.kind(),
                });
            }
            values.push(value);
        }
        Ok(values)
    }

    /// Index prefix followed by the encoded values.
    pub(crate) fn key_for(&self, values: &[Value]) -> Vec<u8> {
        let mut key = self.prefix.clone();
        encode_key_into(&mut key, values);
        key
    }

    /// Key of the primary entry for an encoded primary key.
    pub(crate) fn primary_entry_key(&self, pk_key: &[u8]) -> Vec<u8> {
        let mut key = self.primary_prefix.clone();
        key.extend_from_slice(pk_key);
        key
    }

    /// The secondary entry written for a record.
    pub(crate) fn entry(&self, values: &[Value], pk_key: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut key = self.key_for(values);
        if self.unique {
            (key, pk_key.to_vec())
        } else {
            key.extend_from_slice(pk_key);
            (key, Vec::new())
        }
    }

    /// Recovers the encoded primary key from a raw entry of this index.
    pub(crate) fn pk_key_of(&self, key: &[u8], value: &[u8]) -> OrmResult<Vec<u8>> {
        let Some(rest) = key.strip_prefix(self.prefix.as_slice()) else {
            return Err(ormkv_codec::CodecError::invalid_key(format!(
                "entry does not belong to index {} of {}",
                self.fields, self.type_name
            ))
            .into());
        };
        if self.is_primary() {
            return Ok(rest.to_vec());
        }
        if self.unique {
            return Ok(value.to_vec());
        }
        let mut decoder = KeyDecoder::new(rest);
        for _ in 0..self.fields.len() {
            if decoder.next_value()?.is_none() {
                return Err(ormkv_codec::CodecError::UnexpectedEof.into());
            }
        }
        Ok(decoder.remaining().to_vec())
    }

    /// Decodes the primary key values from a raw entry of this index.
    pub(crate) fn pk_values_of(&self, key: &[u8], value: &[u8]) -> OrmResult<Vec<Value>> {
        Ok(decode_key(&self.pk_key_of(key, value)?)?)
    }

    /// Renders values as `field=value` pairs for diagnostics.
    pub(crate) fn render(&self, values: &[Value]) -> String {
        self.fields
            .iter()
            .zip(values)
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub(crate) fn inconsistent(&self) -> OrmError {
        OrmError::InconsistentIndex {
            type_name: self.type_name.to_string(),
            index: self.fields.to_string(),
        }
    }
}
