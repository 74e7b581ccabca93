//! Deterministic rule-table resolution.
//!
//! Known legacy names map straight to modern names; anything else passes
//! through unchanged at low confidence. Needs no index and no network.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Resolver;
use crate::error::{MapperError, Result};
use crate::types::{CandidateMatch, LegacyItem, MappingResult};

/// Confidence when the column name is a rule key.
pub const RULE_MATCH_CONFIDENCE: f64 = 0.9;

/// Confidence for the identity fallback.
pub const IDENTITY_CONFIDENCE: f64 = 0.3;

const DEFAULT_COLUMN_RULES: &[(&str, &str)] = &[
    ("c_nom", "full_name"),
    ("c_email", "email_address"),
    ("dt_nasc", "birth_date"),
    ("tel_cel", "phone_number"),
    ("end_rua", "street_address"),
    ("end_cep", "postal_code"),
    ("dt_vnd", "order_date"),
    ("vl_tot", "total_amount"),
    ("st_vnd", "order_status"),
    ("nm_prod", "product_name"),
    ("desc_prod", "product_description"),
    ("preco_unit", "unit_price"),
    ("qtd_est", "stock_quantity"),
];

const DEFAULT_TABLE_RULES: &[(&str, &str)] = &[
    ("tb_cli_reg", "customers"),
    ("tb_vendas_hdr", "orders"),
    ("tb_prod_cat", "products"),
];

/// A user-supplied rename rule.
///
/// A pattern containing `*` rewrites every existing column rule whose key
/// contains the pattern's literal part; the `*` in `replacement` is filled
/// with whatever the key has left once that literal part is removed. A
/// pattern without `*` is an exact column rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    pub pattern: String,
    pub replacement: String,
}

impl CustomRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Parse `PATTERN=REPLACEMENT`
    pub fn parse(raw: &str) -> Option<Self> {
        let (pattern, replacement) = raw.split_once('=')?;
        let (pattern, replacement) = (pattern.trim(), replacement.trim());
        if pattern.is_empty() || replacement.is_empty() {
            return None;
        }
        Some(Self::new(pattern, replacement))
    }
}

#[derive(Debug, Deserialize)]
struct RuleRecord {
    kind: String,
    legacy: String,
    modern: String,
}

/// Legacy-to-modern name lookups for tables and columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub table_rules: BTreeMap<String, String>,
    pub column_rules: BTreeMap<String, String>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules for the sample ERP schema
    pub fn builtin() -> Self {
        let collect = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            table_rules: collect(DEFAULT_TABLE_RULES),
            column_rules: collect(DEFAULT_COLUMN_RULES),
        }
    }

    /// Read rules from CSV with a `kind,legacy,modern` header, `kind` being `table` or `column`
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rules = Self::new();
        let mut csv_reader = csv::Reader::from_reader(reader);
        for (line, record) in csv_reader.deserialize::<RuleRecord>().enumerate() {
            let record = record.map_err(|e| MapperError::Config(format!("rule file: {}", e)))?;
            match record.kind.trim().to_ascii_lowercase().as_str() {
                "table" => rules.insert_table(record.legacy.trim(), record.modern.trim()),
                "column" => rules.insert_column(record.legacy.trim(), record.modern.trim()),
                other => {
                    return Err(MapperError::Config(format!(
                        "rule file record {}: unknown kind '{}'",
                        line + 1,
                        other
                    )))
                }
            }
        }
        Ok(rules)
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    pub fn insert_table(&mut self, legacy: &str, modern: &str) {
        self.table_rules.insert(legacy.to_string(), modern.to_string());
    }

    pub fn insert_column(&mut self, legacy: &str, modern: &str) {
        self.column_rules.insert(legacy.to_string(), modern.to_string());
    }

    /// Later entries in `other` win
    pub fn merged(mut self, other: &RuleTable) -> Self {
        self.table_rules
            .extend(other.table_rules.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.column_rules
            .extend(other.column_rules.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Apply custom rules in order, returning the rewritten table
    pub fn with_custom_rules(&self, rules: &[CustomRule]) -> Self {
        let mut table = self.clone();
        for rule in rules {
            if rule.pattern.contains('*') {
                let literal = rule.pattern.replace('*', "");
                let keys: Vec<String> = table
                    .column_rules
                    .keys()
                    .filter(|k| k.contains(literal.as_str()))
                    .cloned()
                    .collect();
                for key in keys {
                    let stem = key.replace(literal.as_str(), "");
                    table
                        .column_rules
                        .insert(key, rule.replacement.replace('*', &stem));
                }
            } else {
                table.insert_column(&rule.pattern, &rule.replacement);
            }
        }
        table
    }
}

/// Heuristic migration notes derived from column names
pub fn suggest_transformations(legacy_column: &str, modern_column: &str) -> Vec<&'static str> {
    let legacy = legacy_column.to_lowercase();
    let modern = modern_column.to_lowercase();
    let mut notes = Vec::new();

    if legacy.contains("dt_") || legacy.contains("date") {
        notes.push("Consider date format conversion (DD/MM/YYYY to YYYY-MM-DD)");
    }
    if legacy.contains("vl_") || legacy.contains("preco") {
        notes.push("Check decimal precision and currency formatting");
    }
    if legacy.contains("tel_") || modern.contains("phone") {
        notes.push("Standardize phone number format");
    }
    if legacy.contains("email") || modern.contains("email") {
        notes.push("Validate email format and normalize case");
    }
    notes
}

/// Rule lookup for one legacy column; pure and infallible
pub fn resolve(
    legacy_table: &str,
    legacy_column: &str,
    table_rules: &BTreeMap<String, String>,
    column_rules: &BTreeMap<String, String>,
) -> MappingResult {
    let modern_table = table_rules
        .get(legacy_table)
        .cloned()
        .unwrap_or_else(|| legacy_table.to_string());
    let rule = column_rules.get(legacy_column);
    let modern_column = rule.cloned().unwrap_or_else(|| legacy_column.to_string());

    let (confidence_score, reasoning) = match rule {
        Some(_) => (
            RULE_MATCH_CONFIDENCE,
            format!(
                "Mapped '{}.{}' to '{}.{}' by naming rule",
                legacy_table, legacy_column, modern_table, modern_column
            ),
        ),
        None => (
            IDENTITY_CONFIDENCE,
            format!(
                "No rule for '{}.{}'; passed through as '{}.{}'",
                legacy_table, legacy_column, modern_table, modern_column
            ),
        ),
    };

    let notes = suggest_transformations(legacy_column, &modern_column);
    let transformation_logic = if notes.is_empty() {
        "Direct mapping".to_string()
    } else {
        notes.join("; ")
    };

    MappingResult {
        legacy_table: legacy_table.to_string(),
        legacy_column: legacy_column.to_string(),
        modern_table,
        modern_column,
        confidence_score,
        transformation_logic,
        reasoning,
    }
}

/// Resolver backed by a [`RuleTable`]
#[derive(Debug, Clone)]
pub struct RuleResolver {
    rules: RuleTable,
}

impl RuleResolver {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}

impl Default for RuleResolver {
    fn default() -> Self {
        Self::new(RuleTable::builtin())
    }
}

impl Resolver for RuleResolver {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn needs_candidates(&self) -> bool {
        false
    }

    fn resolve(&self, item: &LegacyItem, _candidates: &[CandidateMatch]) -> Option<MappingResult> {
        Some(resolve(
            &item.table,
            &item.column,
            &self.rules.table_rules,
            &self.rules.column_rules,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_builtin(table: &str, column: &str) -> MappingResult {
        let rules = RuleTable::builtin();
        resolve(table, column, &rules.table_rules, &rules.column_rules)
    }

    #[test]
    fn test_known_column_maps_with_high_confidence() {
        let result = resolve_builtin("tb_cli_reg", "c_nom");
        assert_eq!(result.modern_table, "customers");
        assert_eq!(result.modern_column, "full_name");
        assert_eq!(result.confidence_score, 0.9);
        assert!(result.reasoning.contains("tb_cli_reg.c_nom"));
        assert!(result.reasoning.contains("customers.full_name"));
    }

    #[test]
    fn test_unknown_column_passes_through_at_low_confidence() {
        let result = resolve_builtin("tb_prod_cat", "id_prod");
        assert_eq!(result.modern_table, "products");
        assert_eq!(result.modern_column, "id_prod");
        assert_eq!(result.confidence_score, 0.3);
    }

    #[test]
    fn test_known_column_in_unknown_table_keeps_table_name() {
        let result = resolve_builtin("tb_misc", "c_email");
        assert_eq!(result.modern_table, "tb_misc");
        assert_eq!(result.modern_column, "email_address");
        assert_eq!(result.confidence_score, 0.9);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        assert_eq!(resolve_builtin("tb_vendas_hdr", "dt_vnd"), resolve_builtin("tb_vendas_hdr", "dt_vnd"));
    }

    #[test]
    fn test_transformation_notes() {
        let result = resolve_builtin("tb_cli_reg", "dt_nasc");
        assert!(result.transformation_logic.contains("date format"));
        let result = resolve_builtin("tb_cli_reg", "c_nom");
        assert_eq!(result.transformation_logic, "Direct mapping");
        assert_eq!(suggest_transformations("tel_cel", "phone_number").len(), 1);
    }

    #[test]
    fn test_wildcard_custom_rule_rewrites_matching_keys() {
        let table = RuleTable::builtin().with_custom_rules(&[CustomRule::new("dt_*", "*_on")]);
        assert_eq!(table.column_rules["dt_nasc"], "nasc_on");
        assert_eq!(table.column_rules["dt_vnd"], "vnd_on");
        assert_eq!(table.column_rules["c_nom"], "full_name");
    }

    #[test]
    fn test_exact_custom_rule_adds_key() {
        let table = RuleTable::builtin().with_custom_rules(&[CustomRule::new("id_cli", "customer_id")]);
        assert_eq!(table.column_rules["id_cli"], "customer_id");
        assert_eq!(table.column_rules.len(), DEFAULT_COLUMN_RULES.len() + 1);
    }

    #[test]
    fn test_custom_rule_parse() {
        assert_eq!(
            CustomRule::parse("dt_* = *_date"),
            Some(CustomRule::new("dt_*", "*_date"))
        );
        assert_eq!(CustomRule::parse("no_separator"), None);
        assert_eq!(CustomRule::parse("=x"), None);
    }

    #[test]
    fn test_rules_from_csv() {
        let csv = "kind,legacy,modern\ntable,tb_x,things\ncolumn,x_nm,thing_name\n";
        let rules = RuleTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(rules.table_rules["tb_x"], "things");
        assert_eq!(rules.column_rules["x_nm"], "thing_name");

        let bad = "kind,legacy,modern\nview,a,b\n";
        assert!(matches!(
            RuleTable::from_csv_reader(bad.as_bytes()),
            Err(MapperError::Config(_))
        ));
    }

    #[test]
    fn test_wildcard_strips_every_occurrence() {
        let mut base = RuleTable::new();
        base.insert_column("dt_dt_x", "x_when");
        base.insert_column("dt_vnd", "order_date");
        let table = base.with_custom_rules(&[CustomRule::new("dt_*", "*_date")]);
        assert_eq!(table.column_rules["dt_dt_x"], "x_date");
        assert_eq!(table.column_rules["dt_vnd"], "vnd_date");
    }
}
