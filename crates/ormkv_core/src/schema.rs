//! The schema: a registry from record type to table.

use crate::config::Config;
use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::table::{Table, TableDef};
use std::collections::HashMap;
use tracing::info;

/// An immutable registry of tables keyed by record type tag.
///
/// Built once with [`Schema::builder`] and shared by every connection.
/// Lookups never depend on record contents, only on the record type.
#[derive(Debug, Clone)]
pub struct Schema {
    config: Config,
    tables: HashMap<&'static str, Table>,
}

impl Schema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Returns the table registered for record type `R`.
    ///
    /// # Errors
    ///
    /// Returns `TableNotFound` if `R` was never registered.
    pub fn table<R: Record>(&self) -> OrmResult<&Table> {
        self.tables
            .get(R::TYPE_NAME)
            .ok_or_else(|| OrmError::table_not_found(R::TYPE_NAME))
    }

    /// Returns the table registered under a type tag.
    #[must_use]
    pub fn table_by_name(&self, type_name: &str) -> Option<&Table> {
        self.tables.get(type_name)
    }

    /// Iterates over all tables in table ID order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        let mut tables: Vec<&Table> = self.tables.values().collect();
        tables.sort_by_key(|table| table.id());
        tables.into_iter()
    }

    /// Returns the number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no table is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns the configuration the schema was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    config: Config,
    tables: Vec<TableDef>,
}

impl SchemaBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Adds a table definition.
    #[must_use]
    pub fn table(mut self, def: TableDef) -> Self {
        self.tables.push(def);
        self
    }

    /// Validates the definitions and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` if a record type or table ID is registered
    /// twice, or if a table definition is invalid.
    pub fn build(self) -> OrmResult<Schema> {
        let mut tables: HashMap<&'static str, Table> = HashMap::with_capacity(self.tables.len());
        for def in self.tables {
            if tables.contains_key(def.type_name()) {
                return Err(OrmError::invalid_schema(format!(
                    "record type {} is registered twice",
                    def.type_name()
                )));
            }
            if let Some(other) = tables.values().find(|table| table.id() == def.id()) {
                return Err(OrmError::invalid_schema(format!(
                    "{} is used by both {} and {}",
                    def.id(),
                    other.type_name(),
                    def.type_name()
                )));
            }
            let table = def.build(&self.config)?;
            tables.insert(table.type_name(), table);
        }

        info!(
            tables = tables.len(),
            prefix_len = self.config.key_prefix.len(),
            "schema built"
        );
        Ok(Schema {
            config: self.config,
            tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Post, User};
    use crate::types::TableId;

    fn schema() -> Schema {
        Schema::builder()
            .table(TableDef::new::<User>(1, "id").unique_index("email"))
            .table(TableDef::new::<Post>(2, "id").index("author"))
            .build()
            .unwrap()
    }

    #[test]
    fn table_lookup_by_type() {
        let schema = schema();
        assert_eq!(schema.table::<User>().unwrap().id(), TableId::new(1));
        assert_eq!(schema.table::<Post>().unwrap().id(), TableId::new(2));
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn table_lookup_by_name() {
        let schema = schema();
        assert_eq!(
            schema.table_by_name("test.Post").unwrap().id(),
            TableId::new(2)
        );
        assert!(schema.table_by_name("test.Comment").is_none());
    }

    #[test]
    fn unregistered_type_is_table_not_found() {
        let schema = Schema::builder()
            .table(TableDef::new::<User>(1, "id"))
            .build()
            .unwrap();
        let err = schema.table::<Post>().unwrap_err();
        assert!(matches!(err, OrmError::TableNotFound { ref type_name } if type_name == "test.Post"));
    }

    #[test]
    fn tables_in_id_order() {
        let schema = Schema::builder()
            .table(TableDef::new::<Post>(9, "id"))
            .table(TableDef::new::<User>(4, "id"))
            .build()
            .unwrap();
        let ids: Vec<u32> = schema.tables().map(|t| t.id().as_u32()).collect();
        assert_eq!(ids, vec![4, 9]);
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let err = Schema::builder()
            .table(TableDef::new::<User>(1, "id"))
            .table(TableDef::new::<User>(2, "id"))
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidSchema { .. }));
    }

    #[test]
    fn duplicate_table_id_is_rejected() {
        let err = Schema::builder()
            .table(TableDef::new::<User>(1, "id"))
            .table(TableDef::new::<Post>(1, "id"))
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidSchema { .. }));
    }

    #[test]
    fn config_is_applied_to_tables() {
        let schema = Schema::builder()
            .with_config(Config::new().strict_delete(true).default_list_limit(10))
            .table(TableDef::new::<User>(1, "id"))
            .build()
            .unwrap();
        let table = schema.table::<User>().unwrap();
        assert!(table.strict_delete());
        assert_eq!(table.default_list_limit(), Some(10));
        assert!(schema.config().strict_delete);
    }
}
