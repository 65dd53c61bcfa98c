//! Table definitions.

use super::index::Index;
use super::Table;
use crate::config::Config;
use crate::error::{OrmError, OrmResult};
use crate::field_names::FieldNames;
use crate::record::{Field, Record};
use crate::types::{IndexId, TableId};
use ormkv_codec::ValueKind;

#[derive(Debug, Clone)]
struct IndexDef {
    fields: String,
    unique: bool,
}

/// Declarative definition of a table, turned into a [`Table`] when the schema
/// is built.
///
/// Field lists are comma separated and validated against `R::FIELDS` at
/// build time.
///
/// ```rust,ignore
/// let users = TableDef::new::<User>(1, "id")
///     .unique_index("email")
///     .index("last_name,first_name");
/// ```
#[derive(Debug, Clone)]
pub struct TableDef {
    id: TableId,
    type_name: &'static str,
    fields: &'static [Field],
    primary_key: String,
    indexes: Vec<IndexDef>,
    strict_delete: Option<bool>,
}

impl TableDef {
    /// Starts a definition for record type `R` with the given table ID and
    /// primary key fields.
    #[must_use]
    pub fn new<R: Record>(id: u32, primary_key: &str) -> Self {
        Self {
            id: TableId::new(id),
            type_name: R::TYPE_NAME,
            fields: R::FIELDS,
            primary_key: primary_key.to_string(),
            indexes: Vec::new(),
            strict_delete: None,
        }
    }

    /// Adds a non-unique secondary index.
    #[must_use]
    pub fn index(mut self, fields: &str) -> Self {
        self.indexes.push(IndexDef {
            fields: fields.to_string(),
            unique: false,
        });
        self
    }

    /// Adds a unique secondary index.
    #[must_use]
    pub fn unique_index(mut self, fields: &str) -> Self {
        self.indexes.push(IndexDef {
            fields: fields.to_string(),
            unique: true,
        });
        self
    }

    /// Overrides the schema's `strict_delete` setting for this table.
    #[must_use]
    pub const fn strict_delete(mut self, value: bool) -> Self {
        self.strict_delete = Some(value);
        self
    }

    /// Returns the table ID.
    #[must_use]
    pub const fn id(&self) -> TableId {
        self.id
    }

    /// Returns the record type tag.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn build(self, config: &Config) -> OrmResult<Table> {
        self.check_declared_fields()?;

        let mut table_prefix = config.key_prefix.clone();
        table_prefix.extend_from_slice(&self.id.as_u32().to_be_bytes());

        let (fields, kinds) = self.resolve(&self.primary_key)?;
        let primary = Index::new(
            IndexId::PRIMARY,
            self.type_name,
            fields,
            kinds,
            true,
            &table_prefix,
        );

        let mut indexes: Vec<Index> = Vec::with_capacity(self.indexes.len());
        for (position, def) in self.indexes.iter().enumerate() {
            let (fields, kinds) = self.resolve(&def.fields)?;
            let duplicate = std::iter::once(&primary)
                .chain(&indexes)
                .any(|index| index.fields().same_set(&fields));
            if duplicate {
                return Err(OrmError::invalid_schema(format!(
                    "table {}: fields {fields} are indexed twice",
                    self.type_name
                )));
            }
            let id = u16::try_from(position + 1).map_err(|_| {
                OrmError::invalid_schema(format!("table {}: too many indexes", self.type_name))
            })?;
            indexes.push(Index::new(
                IndexId::new(id),
                self.type_name,
                fields,
                kinds,
                def.unique,
                &table_prefix,
            ));
        }

        Ok(Table {
            id: self.id,
            type_name: self.type_name,
            primary,
            indexes,
            strict_delete: self.strict_delete.unwrap_or(config.strict_delete),
            default_list_limit: config.default_list_limit,
        })
    }

    fn check_declared_fields(&self) -> OrmResult<()> {
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name() == field.name()) {
                return Err(OrmError::invalid_schema(format!(
                    "record {} declares field {} twice",
                    self.type_name,
                    field.name()
                )));
            }
        }
        Ok(())
    }

    fn resolve(&self, list: &str) -> OrmResult<(FieldNames, Vec<ValueKind>)> {
        let fields = FieldNames::parse(list).map_err(|err| {
            OrmError::invalid_schema(format!("table {}: {err}", self.type_name))
        })?;
        let kinds = fields
            .iter()
            .map(|name| {
                self.fields
                    .iter()
                    .find(|field| field.name() == name)
                    .map(Field::kind)
                    .ok_or_else(|| {
                        OrmError::invalid_schema(format!(
                            "table {}: unknown field {name}",
                            self.type_name
                        ))
                    })
            })
            .collect::<OrmResult<Vec<_>>>()?;
        Ok((fields, kinds))
    }
}
