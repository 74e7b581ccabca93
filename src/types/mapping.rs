use std::collections::BTreeMap;

use crate::types::LegacyItem;
use serde::{Deserialize, Serialize};

/// One proposed correspondence between a legacy column and a modern column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub legacy_table: String,
    pub legacy_column: String,
    pub modern_table: String,
    pub modern_column: String,
    /// In `[0, 1]`
    pub confidence_score: f64,
    pub transformation_logic: String,
    pub reasoning: String,
}

impl MappingResult {
    pub fn legacy_item(&self) -> LegacyItem {
        LegacyItem::new(self.legacy_table.clone(), self.legacy_column.clone())
    }

    pub fn legacy_qualified(&self) -> String {
        format!("{}.{}", self.legacy_table, self.legacy_column)
    }

    pub fn modern_qualified(&self) -> String {
        format!("{}.{}", self.modern_table, self.modern_column)
    }
}

/// Terminal artifact of one mapping run over a legacy schema.
///
/// Every legacy column lands in exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaMapping {
    #[serde(alias = "table_mappings")]
    pub accepted: Vec<MappingResult>,
    pub unmapped_items: Vec<String>,
    /// Why each entry of `unmapped_items` was left out, keyed by `table.column`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unmapped_reasons: BTreeMap<String, String>,
}

impl SchemaMapping {
    pub fn total(&self) -> usize {
        self.accepted.len() + self.unmapped_items.len()
    }

    pub fn unmapped_reason(&self, item: &str) -> Option<&str> {
        self.unmapped_reasons.get(item).map(String::as_str)
    }
}
