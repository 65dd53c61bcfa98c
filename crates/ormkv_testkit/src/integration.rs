//! Cross-crate integration test helpers.
//!
//! Provides a harness that applies operations through a [`Connection`] and
//! mirrors them in a plain map, so the stored state can be checked against
//! the expected one after every step.

use crate::fixtures::{fields, user_schema, User};
use crate::generators::UserOp;
use ormkv_codec::Value;
use ormkv_core::{Connection, ListOptions, OrmError, OrmResult, ReadConnection, Schema};
use ormkv_storage::InMemoryBackend;
use std::collections::BTreeMap;

/// Entries stored per user: primary, unique `email`, non-unique `name`.
pub const ENTRIES_PER_USER: usize = 3;

/// A model-checking harness over the user schema.
pub struct UserHarness {
    schema: Schema,
    backend: InMemoryBackend,
    model: BTreeMap<u64, User>,
}

impl UserHarness {
    /// Creates a harness with an empty in-memory backend.
    pub fn new() -> Self {
        Self {
            schema: user_schema(),
            backend: InMemoryBackend::new(),
            model: BTreeMap::new(),
        }
    }

    /// Applies `op` and checks that its outcome matches the model.
    pub fn apply(&mut self, op: &UserOp) {
        let expected = self.expected_error(op);
        let result = {
            let mut conn = Connection::new(&self.schema, &mut self.backend);
            match op {
                UserOp::Save(user) => conn.save(user),
                UserOp::Insert(user) => conn.insert(user),
                UserOp::Update(user) => conn.update(user),
                UserOp::Delete(id) => conn.delete(&User::new(*id, "")),
            }
        };
        check_outcome(op, expected, result);

        if expected.is_none() {
            match op {
                UserOp::Save(user) | UserOp::Insert(user) | UserOp::Update(user) => {
                    self.model.insert(user.id, user.clone());
                }
                UserOp::Delete(id) => {
                    self.model.remove(id);
                }
            }
        }
    }

    fn expected_error(&self, op: &UserOp) -> Option<Expected> {
        let (user, must_exist) = match op {
            UserOp::Delete(_) => return None,
            UserOp::Save(user) => (user, None),
            UserOp::Insert(user) => (user, Some(false)),
            UserOp::Update(user) => (user, Some(true)),
        };
        let exists = self.model.contains_key(&user.id);
        match must_exist {
            Some(false) if exists => return Some(Expected::AlreadyExists),
            Some(true) if !exists => return Some(Expected::NotFound),
            _ => {}
        }
        let taken = self
            .model
            .values()
            .any(|other| other.id != user.id && other.email == user.email);
        taken.then_some(Expected::UniqueKeyViolation)
    }

    /// Verifies every tracked user through every access path.
    pub fn verify_all(&self) {
        let conn = self.reader();
        for user in self.model.values() {
            let by_id: Option<User> = conn
                .get(&fields("id"), &[Value::Unsigned(user.id)])
                .expect("Failed to get by id");
            assert_eq!(by_id.as_ref(), Some(user), "get by id for {}", user.id);

            let by_email: Option<User> = conn
                .get(&fields("email"), &[Value::from(user.email.as_str())])
                .expect("Failed to get by email");
            assert_eq!(by_email.as_ref(), Some(user), "get by email for {}", user.id);

            assert!(conn
                .has::<User>(&fields("id"), &[Value::Unsigned(user.id)])
                .expect("Failed to check by id"));
        }

        let listed: Vec<User> = conn
            .list(ListOptions::<User>::new())
            .expect("Failed to list")
            .collect::<OrmResult<_>>()
            .expect("Failed to read listed user");
        let expected: Vec<User> = self.model.values().cloned().collect();
        assert_eq!(listed, expected, "list returns every user once, in id order");

        assert_eq!(
            self.backend.len(),
            self.model.len() * ENTRIES_PER_USER,
            "no stale index entries"
        );
        assert_eq!(self.backend.open_iterators(), 0, "no leaked cursors");
    }

    /// Returns a read connection over the harness backend.
    pub fn reader(&self) -> ReadConnection<'_, InMemoryBackend> {
        ReadConnection::new(&self.schema, &self.backend)
    }

    /// Returns the number of tracked users.
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }
}

impl Default for UserHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expected {
    AlreadyExists,
    NotFound,
    UniqueKeyViolation,
}

fn check_outcome(op: &UserOp, expected: Option<Expected>, result: OrmResult<()>) {
    match (expected, result) {
        (None, Ok(())) => {}
        (Some(Expected::AlreadyExists), Err(OrmError::AlreadyExists { .. }))
        | (Some(Expected::NotFound), Err(OrmError::NotFound { .. }))
        | (Some(Expected::UniqueKeyViolation), Err(OrmError::UniqueKeyViolation { .. })) => {}
        (expected, result) => {
            panic!("{op:?}: expected {expected:?}, got {result:?}");
        }
    }
}
