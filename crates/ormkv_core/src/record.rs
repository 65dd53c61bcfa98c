//! The record trait implemented by every stored type.

use ormkv_codec::{Value, ValueKind};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A declared record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    name: &'static str,
    kind: ValueKind,
}

impl Field {
    /// Declares a field.
    #[must_use]
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self { name, kind }
    }

    /// Returns the field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared value kind.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }
}

/// Trait for types that can be stored as records.
///
/// Implementors provide:
/// - `TYPE_NAME`: a stable tag identifying the type in the schema
/// - `FIELDS`: the fields that may take part in indexes
/// - `field_value()`: the current value of a declared field
///
/// The record body itself is stored through `serde`, so fields that are never
/// indexed need not be declared.
///
/// # Example
///
/// ```rust
/// use ormkv_codec::{Value, ValueKind};
/// use ormkv_core::{Field, Record};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     id: u64,
///     email: String,
/// }
///
/// impl Record for User {
///     const TYPE_NAME: &'static str = "example.User";
///     const FIELDS: &'static [Field] = &[
///         Field::new("id", ValueKind::Unsigned),
///         Field::new("email", ValueKind::Text),
///     ];
///
///     fn field_value(&self, name: &str) -> Option<Value> {
///         match name {
///             "id" => Some(Value::Unsigned(self.id)),
///             "email" => Some(Value::Text(self.email.clone())),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned {
    /// Stable type tag. Must be unique within a schema.
    const TYPE_NAME: &'static str;

    /// Declared fields.
    const FIELDS: &'static [Field];

    /// Returns the value of the declared field `name`.
    fn field_value(&self, name: &str) -> Option<Value>;

    /// Looks up a declared field by name.
    #[must_use]
    fn field(name: &str) -> Option<&'static Field> {
        Self::FIELDS.iter().find(|field| field.name == name)
    }
}
