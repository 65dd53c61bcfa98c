//! Read-only and read-write connections.
//!
//! A connection binds a [`Schema`] to a backend view for a short scope. The
//! two handles are distinct types: [`ReadConnection`] borrows the backend
//! shared and has no mutating methods; [`Connection`] borrows it exclusively
//! and adds `save`, `insert`, `update` and `delete`.

use crate::error::{OrmError, OrmResult};
use crate::field_names::FieldNames;
use crate::list::{self, ListOptions, RecordIterator};
use crate::record::Record;
use crate::schema::Schema;
use crate::table::{Index, SaveMode};
use ormkv_codec::Value;
use ormkv_storage::{Backend, ReadBackend};

/// A read-only binding of a schema to a backend view.
pub struct ReadConnection<'a, B: ReadBackend + ?Sized> {
    schema: &'a Schema,
    backend: &'a B,
}

impl<B: ReadBackend + ?Sized> Clone for ReadConnection<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: ReadBackend + ?Sized> Copy for ReadConnection<'_, B> {}

impl<'a, B: ReadBackend + ?Sized> ReadConnection<'a, B> {
    /// Binds `schema` to `backend`.
    #[must_use]
    pub const fn new(schema: &'a Schema, backend: &'a B) -> Self {
        Self { schema, backend }
    }

    /// Returns the bound schema.
    #[must_use]
    pub const fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Looks up a record through the unique index over `fields`.
    ///
    /// `values` are given in the order of `fields`. Returns `Ok(None)` when
    /// no record matches.
    ///
    /// # Errors
    ///
    /// Returns `TableNotFound`, `IndexNotFound` if no unique index covers
    /// exactly `fields`, `ArityMismatch` or `ValueKindMismatch` for bad
    /// values, and codec or backend errors unchanged.
    pub fn get<R: Record>(&self, fields: &FieldNames, values: &[Value]) -> OrmResult<Option<R>> {
        let (index, aligned) = self.resolve::<R>(fields, values)?;
        index.get(self.backend, &aligned)
    }

    /// Like [`ReadConnection::get`], but decodes into `target`.
    ///
    /// Returns true and overwrites `target` if a record matches; leaves
    /// `target` untouched otherwise.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ReadConnection::get`].
    pub fn get_into<R: Record>(
        &self,
        target: &mut R,
        fields: &FieldNames,
        values: &[Value],
    ) -> OrmResult<bool> {
        match self.get::<R>(fields, values)? {
            Some(record) => {
                *target = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Checks whether a record matches, without decoding it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ReadConnection::get`].
    pub fn has<R: Record>(&self, fields: &FieldNames, values: &[Value]) -> OrmResult<bool> {
        let (index, aligned) = self.resolve::<R>(fields, values)?;
        index.has(self.backend, &aligned)
    }

    /// Scans the table of `R`.
    ///
    /// # Errors
    ///
    /// Returns `TableNotFound` and any error of [`list::iterator`].
    pub fn list<R: Record>(&self, options: ListOptions<R>) -> OrmResult<RecordIterator<'a, R, B>> {
        let table = self.schema.table::<R>()?;
        list::iterator(self.backend, table, options)
    }

    fn resolve<R: Record>(
        &self,
        fields: &FieldNames,
        values: &[Value],
    ) -> OrmResult<(&'a Index, Vec<Value>)> {
        let table = self.schema.table::<R>()?;
        let index = table
            .unique_index(fields)
            .ok_or_else(|| OrmError::index_not_found(R::TYPE_NAME, fields))?;
        let aligned = index.align(fields, values)?;
        Ok((index, aligned))
    }
}

/// A read-write binding of a schema to a backend view.
pub struct Connection<'a, B: Backend + ?Sized> {
    schema: &'a Schema,
    backend: &'a mut B,
}

impl<'a, B: Backend + ?Sized> Connection<'a, B> {
    /// Binds `schema` to `backend`.
    #[must_use]
    pub fn new(schema: &'a Schema, backend: &'a mut B) -> Self {
        Self { schema, backend }
    }

    /// Returns the bound schema.
    #[must_use]
    pub const fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Returns a read-only view of this connection.
    #[must_use]
    pub fn reader(&self) -> ReadConnection<'_, B> {
        ReadConnection::new(self.schema, &*self.backend)
    }

    /// See [`ReadConnection::get`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`ReadConnection::get`].
    pub fn get<R: Record>(&self, fields: &FieldNames, values: &[Value]) -> OrmResult<Option<R>> {
        self.reader().get(fields, values)
    }

    /// See [`ReadConnection::get_into`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`ReadConnection::get`].
    pub fn get_into<R: Record>(
        &self,
        target: &mut R,
        fields: &FieldNames,
        values: &[Value],
    ) -> OrmResult<bool> {
        self.reader().get_into(target, fields, values)
    }

    /// See [`ReadConnection::has`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`ReadConnection::get`].
    pub fn has<R: Record>(&self, fields: &FieldNames, values: &[Value]) -> OrmResult<bool> {
        self.reader().has::<R>(fields, values)
    }

    /// See [`ReadConnection::list`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`ReadConnection::list`].
    pub fn list<R: Record>(&self, options: ListOptions<R>) -> OrmResult<RecordIterator<'_, R, B>> {
        self.reader().list(options)
    }

    /// Creates or overwrites a record.
    ///
    /// # Errors
    ///
    /// Returns `TableNotFound`, `UniqueKeyViolation`, and codec or backend
    /// errors unchanged.
    pub fn save<R: Record>(&mut self, record: &R) -> OrmResult<()> {
        self.save_with(record, SaveMode::Upsert)
    }

    /// Creates a record that must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the primary key is present, plus the
    /// conditions of [`Connection::save`].
    pub fn insert<R: Record>(&mut self, record: &R) -> OrmResult<()> {
        self.save_with(record, SaveMode::Insert)
    }

    /// Overwrites a record that must already exist.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the primary key is absent, plus the conditions
    /// of [`Connection::save`].
    pub fn update<R: Record>(&mut self, record: &R) -> OrmResult<()> {
        self.save_with(record, SaveMode::Update)
    }

    /// Writes a record with an explicit [`SaveMode`].
    ///
    /// # Errors
    ///
    /// See [`crate::Table::save`].
    pub fn save_with<R: Record>(&mut self, record: &R, mode: SaveMode) -> OrmResult<()> {
        let table = self.schema.table::<R>()?;
        table.save(&mut *self.backend, record, mode)
    }

    /// Deletes the record with the primary key of `record`.
    ///
    /// Deleting a missing record is a no-op unless the table is strict.
    ///
    /// # Errors
    ///
    /// Returns `TableNotFound`, `NotFound` on a strict table, and codec or
    /// backend errors unchanged.
    pub fn delete<R: Record>(&mut self, record: &R) -> OrmResult<()> {
        let table = self.schema.table::<R>()?;
        table.delete(&mut *self.backend, record)
    }

    /// Flushes the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    pub fn flush(&mut self) -> OrmResult<()> {
        Ok(self.backend.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableDef;
    use crate::test_support::{Post, User};
    use ormkv_storage::InMemoryBackend;

    fn schema() -> Schema {
        Schema::builder()
            .table(TableDef::new::<User>(1, "id").unique_index("email").index("name"))
            .build()
            .unwrap()
    }

    fn fields(list: &str) -> FieldNames {
        FieldNames::parse(list).unwrap()
    }

    #[test]
    fn insert_then_get_by_every_unique_index() {
        let schema = schema();
        let mut backend = InMemoryBackend::new();
        let user = User::named(1, "a@x.com", "ann");
        Connection::new(&schema, &mut backend).insert(&user).unwrap();

        let conn = ReadConnection::new(&schema, &backend);
        assert_eq!(
            conn.get::<User>(&fields("id"), &[Value::Unsigned(1)]).unwrap(),
            Some(user.clone())
        );
        assert_eq!(
            conn.get::<User>(&fields("email"), &[Value::from("a@x.com")])
                .unwrap(),
            Some(user)
        );
    }

    #[test]
    fn get_into_overwrites_only_on_hit() {
        let schema = schema();
        let mut backend = InMemoryBackend::new();
        let mut conn = Connection::new(&schema, &mut backend);
        conn.save(&User::new(1, "a@x.com")).unwrap();

        let mut target = User::new(0, "");
        assert!(!conn
            .get_into(&mut target, &fields("id"), &[Value::Unsigned(2)])
            .unwrap());
        assert_eq!(target, User::new(0, ""));
        assert!(conn
            .get_into(&mut target, &fields("id"), &[Value::Unsigned(1)])
            .unwrap());
        assert_eq!(target.email, "a@x.com");
    }

    #[test]
    fn has_agrees_with_get() {
        let schema = schema();
        let mut backend = InMemoryBackend::new();
        Connection::new(&schema, &mut backend)
            .save(&User::new(1, "a@x.com"))
            .unwrap();
        let conn = ReadConnection::new(&schema, &backend);
        for id in [1, 2] {
            let key = [Value::Unsigned(id)];
            let found = conn.get::<User>(&fields("id"), &key).unwrap().is_some();
            assert_eq!(conn.has::<User>(&fields("id"), &key).unwrap(), found);
        }
    }

    #[test]
    fn non_unique_field_set_is_index_not_found() {
        let schema = schema();
        let backend = InMemoryBackend::new();
        let conn = ReadConnection::new(&schema, &backend);
        let err = conn
            .get::<User>(&fields("name"), &[Value::from("ann")])
            .unwrap_err();
        match err {
            OrmError::IndexNotFound { type_name, fields } => {
                assert_eq!(type_name, "test.User");
                assert_eq!(fields, "name");
            }
            other => panic!("unexpected error: {other}"),
        }
        // resolution fails before values are looked at
        assert!(matches!(
            conn.has::<User>(&fields("id,email"), &[]),
            Err(OrmError::IndexNotFound { .. })
        ));
    }

    #[test]
    fn arity_mismatch_fails_fast() {
        let schema = schema();
        let backend = InMemoryBackend::new();
        let conn = ReadConnection::new(&schema, &backend);
        let err = conn
            .get::<User>(&fields("id"), &[Value::Unsigned(1), Value::Unsigned(2)])
            .unwrap_err();
        assert!(matches!(
            err,
            OrmError::ArityMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn unregistered_type_is_table_not_found() {
        let schema = schema();
        let mut backend = InMemoryBackend::new();
        let mut conn = Connection::new(&schema, &mut backend);
        assert!(matches!(
            conn.save(&Post::new(1, 1, "t")),
            Err(OrmError::TableNotFound { .. })
        ));
        assert!(matches!(
            conn.get::<Post>(&fields("id"), &[Value::Unsigned(1)]),
            Err(OrmError::TableNotFound { .. })
        ));
        assert!(matches!(
            conn.list(ListOptions::<Post>::new()),
            Err(OrmError::TableNotFound { .. })
        ));
    }

    #[test]
    fn save_modes() {
        let schema = schema();
        let mut backend = InMemoryBackend::new();
        let mut conn = Connection::new(&schema, &mut backend);

        assert!(conn.update(&User::new(1, "a@x.com")).unwrap_err().is_not_found());
        conn.insert(&User::new(1, "a@x.com")).unwrap();
        assert!(conn
            .insert(&User::new(1, "b@x.com"))
            .unwrap_err()
            .is_already_exists());
        conn.update(&User::new(1, "b@x.com")).unwrap();
        conn.save(&User::new(1, "c@x.com")).unwrap();
        conn.save(&User::new(2, "d@x.com")).unwrap();

        let emails: Vec<String> = conn
            .list(ListOptions::<User>::new())
            .unwrap()
            .map(|user| user.unwrap().email)
            .collect();
        assert_eq!(emails, vec!["c@x.com", "d@x.com"]);
    }

    #[test]
    fn delete_then_get_is_none() {
        let schema = schema();
        let mut backend = InMemoryBackend::new();
        let mut conn = Connection::new(&schema, &mut backend);
        conn.insert(&User::new(1, "a@x.com")).unwrap();
        conn.delete(&User::new(1, "a@x.com")).unwrap();
        assert_eq!(
            conn.get::<User>(&fields("id"), &[Value::Unsigned(1)]).unwrap(),
            None
        );
        assert!(!conn
            .has::<User>(&fields("email"), &[Value::from("a@x.com")])
            .unwrap());
        conn.delete(&User::new(1, "a@x.com")).unwrap();
    }

    #[test]
    fn reader_shares_the_backend() {
        let schema = schema();
        let mut backend = InMemoryBackend::new();
        let mut conn = Connection::new(&schema, &mut backend);
        conn.save(&User::new(5, "e@x.com")).unwrap();
        let reader = conn.reader();
        let copy = reader;
        assert!(copy.has::<User>(&fields("id"), &[Value::Unsigned(5)]).unwrap());
        assert!(reader.has::<User>(&fields("id"), &[Value::Unsigned(5)]).unwrap());
    }
}
