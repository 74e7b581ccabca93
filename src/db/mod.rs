mod schema;
pub mod seed;

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub use schema::{extract_schema, get_columns, get_foreign_keys, get_tables, ForeignKey};

use crate::types::SchemaSnapshot;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database file not found: {0}")]
    NotFound(String),
    #[error("Invalid SQLite file: {0}")]
    InvalidFile(String),
    #[error("Database already exists: {0}")]
    AlreadyExists(String),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open an existing database read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        if !path.as_ref().exists() {
            return Err(DatabaseError::NotFound(path_str));
        }

        let conn = Connection::open_with_flags(path.as_ref(), OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        // Opening is lazy; touch the schema so a non-database file fails here
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| {
            if e.to_string().contains("not a database") || e.to_string().contains("file is encrypted") {
                DatabaseError::InvalidFile(path_str.clone())
            } else {
                DatabaseError::Sqlite(e)
            }
        })?;

        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        debug!(path = %path_str, "opened database");
        Ok(Self { conn })
    }

    /// Wrap an already-open connection (in-memory databases, tests)
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Read the structural snapshot of every user table
    pub fn extract(&self) -> Result<SchemaSnapshot, DatabaseError> {
        extract_schema(&self.conn)
    }
}

/// Open `path` and extract its schema in one step
pub fn extract_path<P: AsRef<Path>>(path: P) -> Result<SchemaSnapshot, DatabaseError> {
    Database::open(path)?.extract()
}
