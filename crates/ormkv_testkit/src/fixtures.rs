//! Test fixtures and backend helpers.
//!
//! Provides the record types used across the integration tests, the schemas
//! built over them, and convenience functions for setting up backends.

use ormkv_codec::{Value, ValueKind};
use ormkv_core::{Config, Connection, Field, FieldNames, Record, Schema, TableDef};
use ormkv_storage::{
    Backend, Direction, FileBackend, InMemoryBackend, KeyRange, KvIter, ReadBackend,
    StorageError, StorageResult, WriteOp,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A user, keyed by `id`, with a unique `email` and a non-unique `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Primary key.
    pub id: u64,
    /// Unique per user.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl User {
    /// Creates a user with an empty name.
    pub fn new(id: u64, email: &str) -> Self {
        Self::named(id, email, "")
    }

    /// Creates a user with a name.
    pub fn named(id: u64, email: &str, name: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            name: name.to_string(),
        }
    }
}

impl Record for User {
    const TYPE_NAME: &'static str = "testkit.User";
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

/// A post, keyed by `(author, id)`, with a non-unique `published` index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Author's user ID.
    pub author: u64,
    /// Sequence number within the author's posts.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Whether the post is visible.
    pub published: bool,
}

impl Post {
    /// Creates an unpublished post.
    pub fn new(author: u64, id: u64, title: &str) -> Self {
        Self {
            author,
            id,
            title: title.to_string(),
            published: false,
        }
    }

    /// Marks the post published.
    #[must_use]
    pub fn published(mut self) -> Self {
        self.published = true;
        self
    }
}

impl Record for Post {
    const TYPE_NAME: &'static str = "testkit.Post";
    const FIELDS: &'static [Field] = &[
        Field::new("author", ValueKind::Unsigned),
        Field::new("id", ValueKind::Unsigned),
        Field::new("title", ValueKind::Text),
        Field::new("published", ValueKind::Bool),
    ];

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "author" => Some(Value::Unsigned(self.author)),
            "id" => Some(Value::Unsigned(self.id)),
            "title" => Some(Value::Text(self.title.clone())),
            "published" => Some(Value::Bool(self.published)),
            _ => None,
        }
    }
}

/// A record type that no fixture schema registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unregistered {
    /// Primary key.
    pub id: u64,
}

impl Record for Unregistered {
    const TYPE_NAME: &'static str = "testkit.Unregistered";
    const FIELDS: &'static [Field] = &[Field::new("id", ValueKind::Unsigned)];

    fn field_value(&self, name: &str) -> Option<Value> {
        (name == "id").then_some(Value::Unsigned(self.id))
    }
}

/// Parses a comma-separated field list, panicking on bad input.
pub fn fields(list: &str) -> FieldNames {
    FieldNames::parse(list).expect("Invalid field list")
}

/// Schema with the `User` table only.
pub fn user_schema() -> Schema {
    user_schema_with(Config::default())
}

/// Schema with the `User` table only, built with `config`.
pub fn user_schema_with(config: Config) -> Schema {
    Schema::builder()
        .with_config(config)
        .table(user_table())
        .build()
        .expect("Failed to build user schema")
}

/// Schema with both the `User` and `Post` tables.
pub fn blog_schema() -> Schema {
    blog_schema_with(Config::default())
}

/// Schema with both the `User` and `Post` tables, built with `config`.
pub fn blog_schema_with(config: Config) -> Schema {
    Schema::builder()
        .with_config(config)
        .table(user_table())
        .table(
            TableDef::new::<Post>(2, "author,id")
                .index("published"),
        )
        .build()
        .expect("Failed to build blog schema")
}

fn user_table() -> TableDef {
    TableDef::new::<User>(1, "id")
        .unique_index("email")
        .index("name")
}

/// A file backend in a temporary directory, removed on drop.
pub struct TestFileBackend {
    /// The backend instance.
    pub backend: FileBackend,
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TestFileBackend {
    /// Opens a fresh backend.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("data").join("ormkv.log");
        let backend =
            FileBackend::open_with_create_dirs(&path).expect("Failed to open file backend");
        Self {
            backend,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the backend and opens the same file again.
    pub fn reopen(self) -> Self {
        let Self {
            backend,
            path,
            _temp_dir,
        } = self;
        drop(backend);
        let backend = FileBackend::open(&path).expect("Failed to reopen file backend");
        Self {
            backend,
            path,
            _temp_dir,
        }
    }
}

impl Default for TestFileBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `f` with a read-write connection over a fresh in-memory backend.
///
/// The backend is returned so the caller can inspect it afterwards.
pub fn with_memory_connection<F>(schema: &Schema, f: F) -> InMemoryBackend
where
    F: FnOnce(&mut Connection<'_, InMemoryBackend>),
{
    let mut backend = InMemoryBackend::new();
    f(&mut Connection::new(schema, &mut backend));
    backend
}

/// The error a [`FailingBackend`] injects.
pub fn injected_failure() -> StorageError {
    StorageError::Corrupted("injected failure".to_string())
}

/// Returns true if `err` is the error a [`FailingBackend`] injects.
pub fn is_injected_failure(err: &StorageError) -> bool {
    matches!(err, StorageError::Corrupted(message) if message == "injected failure")
}

/// An in-memory backend that fails once on a chosen write operation.
///
/// Write operations are numbered from zero across `set`, `delete` and each
/// operation of an `apply` batch. A batch containing the failing operation
/// is rejected whole, as an atomic backend would on a failed write, and the
/// failure is disarmed afterwards.
#[derive(Debug, Default)]
pub struct FailingBackend {
    /// The wrapped backend.
    pub inner: InMemoryBackend,
    fail_at: Option<usize>,
    fail_reads: bool,
    writes: usize,
}

impl FailingBackend {
    /// Wraps `inner` with no failure armed.
    pub fn new(inner: InMemoryBackend) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Arms a failure on the write operation `offset` operations from now.
    pub fn fail_at(&mut self, offset: usize) {
        self.fail_at = Some(self.writes + offset);
    }

    /// Makes every `get` and `has` fail until disarmed.
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Returns the number of write operations applied so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn admit(&mut self, count: usize) -> StorageResult<()> {
        if let Some(at) = self.fail_at {
            if (self.writes..self.writes + count).contains(&at) {
                self.fail_at = None;
                return Err(injected_failure());
            }
        }
        self.writes += count;
        Ok(())
    }
}

impl ReadBackend for FailingBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        if self.fail_reads {
            return Err(injected_failure());
        }
        self.inner.get(key)
    }

    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        if self.fail_reads {
            return Err(injected_failure());
        }
        self.inner.has(key)
    }

    fn iter(&self, range: &KeyRange, direction: Direction) -> StorageResult<KvIter<'_>> {
        self.inner.iter(range, direction)
    }
}

impl Backend for FailingBackend {
    fn set(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.admit(1)?;
        self.inner.set(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        self.admit(1)?;
        self.inner.delete(key)
    }

    fn apply(&mut self, ops: &[WriteOp]) -> StorageResult<()> {
        self.admit(ops.len())?;
        self.inner.apply(ops)
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Returns `count` users with ids `1..=count` and distinct emails.
    pub fn users(count: u64) -> Vec<User> {
        (1..=count)
            .map(|id| User::named(id, &format!("user{id}@example.com"), &format!("name{}", id % 3)))
            .collect()
    }

    /// An in-memory backend holding [`users`] under `schema`.
    pub fn populated_users(schema: &Schema, count: u64) -> InMemoryBackend {
        with_memory_connection(schema, |conn| {
            for user in users(count) {
                conn.insert(&user).expect("Failed to insert user");
            }
        })
    }
}
