use super::DatabaseError;
use crate::types::{ColumnInfo, SchemaSnapshot, TableInfo};
use rusqlite::Connection;
use tracing::debug;

/// A foreign-key constraint as reported by `PRAGMA foreign_key_list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub from_column: String,
    pub to_table: String,
    /// `None` when the constraint names only the table and implies its primary key
    pub to_column: Option<String>,
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Get all user tables in declaration order
pub fn get_tables(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
    )?;

    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tables)
}

/// Get columns for a table, without foreign-key references
pub fn get_columns(conn: &Connection, table_name: &str) -> Result<Vec<ColumnInfo>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote(table_name)))?;

    let columns = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let data_type: String = row.get(2)?;
            let not_null: bool = row.get(3)?;
            // pk is the 1-based position within the primary key, 0 when not part of it
            let pk: i64 = row.get(5)?;

            Ok(ColumnInfo {
                name,
                data_type,
                nullable: !not_null,
                is_primary_key: pk > 0,
                foreign_key_ref: None,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(columns)
}

/// Get foreign keys for a table
pub fn get_foreign_keys(conn: &Connection, table_name: &str) -> Result<Vec<ForeignKey>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", quote(table_name)))?;

    let fks = stmt
        .query_map([], |row| {
            Ok(ForeignKey {
                to_table: row.get(2)?,
                from_column: row.get(3)?,
                to_column: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(fks)
}

/// Primary-key column of `table`, used when a constraint omits the referenced column
fn primary_key_of(conn: &Connection, table: &str) -> Option<String> {
    get_columns(conn, table)
        .ok()?
        .into_iter()
        .find(|c| c.is_primary_key)
        .map(|c| c.name)
}

/// Enumerate every table and column, then attach foreign-key references.
///
/// An empty database yields an empty snapshot.
pub fn extract_schema(conn: &Connection) -> Result<SchemaSnapshot, DatabaseError> {
    let mut tables = Vec::new();

    for table_name in get_tables(conn)? {
        let mut columns = get_columns(conn, &table_name)?;

        for fk in get_foreign_keys(conn, &table_name)? {
            let to_column = fk
                .to_column
                .clone()
                .or_else(|| primary_key_of(conn, &fk.to_table));
            let target = match to_column {
                Some(col) => format!("{}.{}", fk.to_table, col),
                None => fk.to_table.clone(),
            };
            if let Some(col) = columns.iter_mut().find(|c| c.name == fk.from_column) {
                col.foreign_key_ref = Some(target);
            }
        }

        debug!(table = %table_name, columns = columns.len(), "extracted table");
        tables.push(TableInfo::new(table_name, columns));
    }

    Ok(SchemaSnapshot::new(tables))
}
