//! Record types shared by the unit tests.

use crate::record::{Field, Record};
use ormkv_codec::{Value, ValueKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub name: String,
}

impl User {
    pub fn new(id: u64, email: &str) -> Self {
        Self::named(id, email, "")
    }

    pub fn named(id: u64, email: &str, name: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            name: name.to_string(),
        }
    }
}

impl Record for User {
    const TYPE_NAME: &'static str = "test.User";
    const FIELDS: &'static [Field] = &[
        Field::new("id", ValueKind::Unsigned),
        Field::new("email", ValueKind::Text),
        Field::new("name", ValueKind::Text),
    ];

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Unsigned(self.id)),
            "email" => Some(Value::Text(self.email.clone())),
            "name" => Some(Value::Text(self.name.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub author: u64,
    pub title: String,
}

impl Post {
    pub fn new(id: u64, author: u64, title: &str) -> Self {
        Self {
            id,
            author,
            title: title.to_string(),
        }
    }
}

impl Record for Post {
    const TYPE_NAME: &'static str = "test.Post";
    const FIELDS: &'static [Field] = &[
        Field::new("id", ValueKind::Unsigned),
        Field::new("author", ValueKind::Unsigned),
        Field::new("title", ValueKind::Text),
    ];

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Unsigned(self.id)),
            "author" => Some(Value::Unsigned(self.author)),
            "title" => Some(Value::Text(self.title.clone())),
            _ => None,
        }
    }
}
