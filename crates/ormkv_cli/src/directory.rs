//! The member directory schema.

use ormkv_codec::{Value, ValueKind};
use ormkv_core::{Config, Field, OrmResult, Record, Schema, TableDef};
use serde::{Deserialize, Serialize};

/// A directory member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member ID (primary key).
    pub id: u64,
    /// Email address, unique across the directory.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Team the member belongs to.
    pub team: String,
}

impl Record for Member {
    const TYPE_NAME: &'static str = "directory.Member";
    const FIELDS: &'static [Field] = &[
        Field::new("id", ValueKind::Unsigned),
        Field::new("email", ValueKind::Text),
        Field::new("name", ValueKind::Text),
        Field::new("team", ValueKind::Text),
    ];

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Unsigned(self.id)),
            "email" => Some(Value::Text(self.email.clone())),
            "name" => Some(Value::Text(self.name.clone())),
            "team" => Some(Value::Text(self.team.clone())),
            _ => None,
        }
    }
}

/// Builds the directory schema.
pub fn schema(strict_delete: bool) -> OrmResult<Schema> {
    Schema::builder()
        .with_config(Config::new().key_prefix(b"dir/".to_vec()).strict_delete(strict_delete))
        .table(
            TableDef::new::<Member>(1, "id")
                .unique_index("email")
                .index("team"),
        )
        .build()
}
