//! # ormkv Core
//!
//! Typed record access over an ordered key-value backend.
//!
//! This crate provides:
//! - [`Record`]: the trait every stored type implements
//! - [`Schema`]: an immutable registry from record type to [`Table`]
//! - [`Table`] and [`Index`]: key layout, save modes and index maintenance
//! - [`ReadConnection`] and [`Connection`]: the get/has/list and
//!   save/insert/update/delete surface
//! - [`list`]: lazy range scans with paging and filters
//!
//! ## Example
//!
//! ```rust
//! use ormkv_codec::{Value, ValueKind};
//! use ormkv_core::{Connection, Field, FieldNames, ReadConnection, Record, Schema, TableDef};
//! use ormkv_storage::InMemoryBackend;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     id: u64,
//!     email: String,
//! }
//!
//! impl Record for User {
//!     const TYPE_NAME: &'static str = "example.User";
//!     const FIELDS: &'static [Field] = &[
//!         Field::new("id", ValueKind::Unsigned),
//!         Field::new("email", ValueKind::Text),
//!     ];
//!
//!     fn field_value(&self, name: &str) -> Option<Value> {
//!         match name {
//!             "id" => Some(Value::Unsigned(self.id)),
//!             "email" => Some(Value::Text(self.email.clone())),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let schema = Schema::builder()
//!     .table(TableDef::new::<User>(1, "id").unique_index("email"))
//!     .build()
//!     .unwrap();
//! let mut backend = InMemoryBackend::new();
//!
//! Connection::new(&schema, &mut backend)
//!     .insert(&User { id: 1, email: "a@x.com".into() })
//!     .unwrap();
//!
//! let conn = ReadConnection::new(&schema, &backend);
//! let email = FieldNames::parse("email").unwrap();
//! let user: Option<User> = conn.get(&email, &[Value::from("a@x.com")]).unwrap();
//! assert_eq!(user.map(|u| u.id), Some(1));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connection;
mod error;
mod field_names;
pub mod list;
mod record;
mod schema;
mod table;
mod types;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use connection::{Connection, ReadConnection};
pub use error::{OrmError, OrmResult};
pub use field_names::FieldNames;
pub use list::{Cursor, KeyIterator, ListOptions, Page, RecordIterator};
pub use record::{Field, Record};
pub use schema::{Schema, SchemaBuilder};
pub use table::{Index, SaveMode, Table, TableDef};
pub use types::{IndexId, TableId};
