//! Inspect command implementation.

use ormkv_core::{Index, OrmError, OrmResult, Schema, Table};
use ormkv_storage::{Direction, KeyRange, ReadBackend};
use serde::Serialize;

/// Directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Total number of raw entries in the backend.
    pub entry_count: usize,
    /// Per-table statistics.
    pub tables: Vec<TableStats>,
}

/// Statistics for a single table.
#[derive(Debug, Serialize)]
pub struct TableStats {
    /// Table ID.
    pub id: u32,
    /// Record type tag.
    pub type_name: String,
    /// Entries per index, primary first.
    pub indexes: Vec<IndexStats>,
}

/// Statistics for a single index.
#[derive(Debug, Serialize)]
pub struct IndexStats {
    /// Index ID.
    pub id: u16,
    /// Indexed fields, comma separated.
    pub fields: String,
    /// Whether the index is unique.
    pub unique: bool,
    /// Number of entries.
    pub entry_count: usize,
}

/// Collects statistics for every table of `schema`, or only for the table
/// registered under `type_name`.
///
/// # Errors
///
/// Returns `TableNotFound` for an unknown `type_name`, and any backend error.
pub fn collect<B: ReadBackend + ?Sized>(
    schema: &Schema,
    backend: &B,
    type_name: Option<&str>,
) -> OrmResult<InspectResult> {
    let selected: Vec<&Table> = match type_name {
        Some(name) => vec![schema
            .table_by_name(name)
            .ok_or_else(|| OrmError::table_not_found(name))?],
        None => schema.tables().collect(),
    };
    let entry_count = count(backend, &KeyRange::all())?;
    let mut tables = Vec::new();
    for table in selected {
        let mut indexes = Vec::new();
        for index in std::iter::once(table.primary()).chain(table.indexes()) {
            indexes.push(index_stats(backend, index)?);
        }
        tables.push(TableStats {
            id: table.id().as_u32(),
            type_name: table.type_name().to_string(),
            indexes,
        });
    }
    Ok(InspectResult {
        entry_count,
        tables,
    })
}

fn index_stats<B: ReadBackend + ?Sized>(backend: &B, index: &Index) -> OrmResult<IndexStats> {
    Ok(IndexStats {
        id: index.id().as_u16(),
        fields: index.fields().to_string(),
        unique: index.is_unique(),
        entry_count: count(backend, &KeyRange::prefix(index.prefix()))?,
    })
}

fn count<B: ReadBackend + ?Sized>(backend: &B, range: &KeyRange) -> OrmResult<usize> {
    let mut total = 0;
    for entry in backend.iter(range, Direction::Forward)? {
        entry?;
        total += 1;
    }
    Ok(total)
}

/// Runs the inspect command.
pub fn run<B: ReadBackend + ?Sized>(
    schema: &Schema,
    backend: &B,
    type_name: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(schema, backend, type_name)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Entries: {}", result.entry_count);
    for table in &result.tables {
        println!();
        println!("Table {} ({})", table.id, table.type_name);
        for index in &table.indexes {
            println!(
                "  idx:{:<3} {:<16} {:<10} {} entries",
                index.id,
                index.fields,
                if index.unique { "unique" } else { "non-unique" },
                index.entry_count
            );
        }
    }
}
