use serde::{Deserialize, Serialize};
use std::fmt;

/// Information about a table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// `referenced_table.referenced_column` when the column is constrained by a foreign key
    pub foreign_key_ref: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            is_primary_key: false,
            foreign_key_ref: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.foreign_key_ref = Some(target.into());
        self
    }

    /// `name (type)` followed by key markers, as used in table descriptions
    pub fn describe(&self) -> String {
        let mut desc = format!("{} ({})", self.name, self.data_type);
        if self.is_primary_key {
            desc.push_str(" [PRIMARY KEY]");
        }
        if let Some(target) = &self.foreign_key_ref {
            desc.push_str(&format!(" [FOREIGN KEY -> {}]", target));
        }
        desc
    }

    /// Embedding document for a single column of `table`
    pub fn document(&self, table: &str) -> String {
        format!(
            "column {} in table {} - type {}",
            self.name, table, self.data_type
        )
    }
}

/// Information about a database table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Natural-language description used as the table-level embedding document.
    ///
    /// This is a pure function of the struct fields so that re-indexing the same
    /// snapshot always produces identical documents.
    pub fn description(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnInfo::describe).collect();
        format!("Table: {}\nColumns: {}", self.name, columns.join(", "))
    }
}

/// Structural snapshot of one database at extraction time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableInfo>,
}

impl SchemaSnapshot {
    pub fn new(tables: Vec<TableInfo>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    /// Every column as a legacy item, in table then column declaration order
    pub fn items(&self) -> Vec<LegacyItem> {
        self.tables
            .iter()
            .flat_map(|t| {
                t.columns
                    .iter()
                    .map(move |c| LegacyItem::new(t.name.clone(), c.name.clone()))
            })
            .collect()
    }
}

/// A `table.column` reference into the legacy schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegacyItem {
    pub table: String,
    pub column: String,
}

impl LegacyItem {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Split on the first `.`; both halves must be non-empty
    pub fn parse(qualified: &str) -> Option<Self> {
        let (table, column) = qualified.split_once('.')?;
        if table.is_empty() || column.is_empty() {
            return None;
        }
        Some(Self::new(table, column))
    }

    /// Free-text query sent to the candidate index for this item
    pub fn search_text(&self) -> String {
        format!("database column field {}", self)
    }
}

impl fmt::Display for LegacyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}
