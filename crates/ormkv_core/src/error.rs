//! Error types for ormkv core.

use crate::field_names::FieldNames;
use ormkv_codec::ValueKind;
use thiserror::Error;

/// Result type for core operations.
pub type OrmResult<T> = Result<T, OrmError>;

/// Errors that can occur in ormkv core operations.
///
/// `TableNotFound`, `IndexNotFound`, `ArityMismatch` and `ValueKindMismatch`
/// are programmer errors: retrying the same call gives the same result.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] ormkv_storage::StorageError),

    /// Key or record codec error.
    #[error("codec error: {0}")]
    Codec(#[from] ormkv_codec::CodecError),

    /// The record type was never registered with the schema.
    #[error("table not found for record type {type_name}")]
    TableNotFound {
        /// Type tag of the record.
        type_name: String,
    },

    /// No index of the table matches the requested field set.
    #[error("can't find index on table {type_name} for fields {fields}")]
    IndexNotFound {
        /// Type tag of the record.
        type_name: String,
        /// The requested field names, comma separated.
        fields: String,
    },

    /// Insert of a primary key that is already present.
    #[error("record {type_name} with key {key} already exists")]
    AlreadyExists {
        /// Type tag of the record.
        type_name: String,
        /// The primary key, rendered as `field=value` pairs.
        key: String,
    },

    /// Update (or strict delete) of a primary key that is absent.
    #[error("record {type_name} with key {key} not found")]
    NotFound {
        /// Type tag of the record.
        type_name: String,
        /// The primary key, rendered as `field=value` pairs.
        key: String,
    },

    /// A save would give a unique index two owners for one key.
    #[error("unique index {index} on table {type_name} already holds key {key}")]
    UniqueKeyViolation {
        /// Type tag of the record.
        type_name: String,
        /// Field names of the violated index.
        index: String,
        /// The conflicting index key, rendered as `field=value` pairs.
        key: String,
    },

    /// The number of lookup values does not match the field names.
    #[error("expected {expected} values for fields {fields}, got {actual}")]
    ArityMismatch {
        /// The field names the values were matched against.
        fields: String,
        /// Number of fields.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// A value's kind does not match the declared kind of its field.
    #[error("field {field} expects a {expected} value, got {actual}")]
    ValueKindMismatch {
        /// The field name.
        field: String,
        /// Declared kind.
        expected: ValueKind,
        /// Supplied kind.
        actual: ValueKind,
    },

    /// A record did not produce a value for one of its declared key fields.
    #[error("record {type_name} has no value for field {field}")]
    MissingField {
        /// Type tag of the record.
        type_name: String,
        /// The missing field.
        field: String,
    },

    /// A secondary index entry points at a record that does not exist.
    #[error("index {index} on table {type_name} points at a missing record")]
    InconsistentIndex {
        /// Type tag of the record.
        type_name: String,
        /// Field names of the index.
        index: String,
    },

    /// The schema definition is invalid.
    #[error("invalid schema: {message}")]
    InvalidSchema {
        /// Description of the problem.
        message: String,
    },

    /// A field-name list is malformed.
    #[error("invalid field names: {message}")]
    InvalidFieldNames {
        /// Description of the problem.
        message: String,
    },

    /// List options are contradictory or do not fit the index.
    #[error("invalid list options: {message}")]
    InvalidListOptions {
        /// Description of the problem.
        message: String,
    },
}

impl OrmError {
    /// Creates a table not found error.
    pub fn table_not_found(type_name: impl Into<String>) -> Self {
        Self::TableNotFound {
            type_name: type_name.into(),
        }
    }

    /// Creates an index not found error.
    pub fn index_not_found(type_name: impl Into<String>, fields: &FieldNames) -> Self {
        Self::IndexNotFound {
            type_name: type_name.into(),
            fields: fields.to_string(),
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates an invalid field names error.
    pub fn invalid_field_names(message: impl Into<String>) -> Self {
        Self::InvalidFieldNames {
            message: message.into(),
        }
    }

    /// Creates an invalid list options error.
    pub fn invalid_list_options(message: impl Into<String>) -> Self {
        Self::InvalidListOptions {
            message: message.into(),
        }
    }

    /// Returns true for `AlreadyExists`.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns true for `NotFound`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
