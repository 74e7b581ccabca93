//! Migration script generation.
//!
//! Mappings are grouped by target table in first-seen order and each group
//! becomes one `INSERT ... SELECT`. The `FROM` clause names only the legacy
//! table of the group's first mapping: when a target table is fed by several
//! legacy tables the script needs hand-written JOINs.

use crate::types::MappingResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptOptions {
    /// Double-quote identifiers that are not plain `[A-Za-z_][A-Za-z0-9_]*`
    pub quote_identifiers: bool,
}

/// Mappings sharing a target table, in input order
#[derive(Debug)]
pub struct TableGroup<'a> {
    pub modern_table: &'a str,
    pub mappings: Vec<&'a MappingResult>,
}

/// Group by `modern_table`, groups ordered by first appearance
pub fn group_by_target(mappings: &[MappingResult]) -> Vec<TableGroup<'_>> {
    let mut groups: Vec<TableGroup<'_>> = Vec::new();
    for mapping in mappings {
        match groups
            .iter_mut()
            .find(|g| g.modern_table == mapping.modern_table)
        {
            Some(group) => group.mappings.push(mapping),
            None => groups.push(TableGroup {
                modern_table: &mapping.modern_table,
                mappings: vec![mapping],
            }),
        }
    }
    groups
}

fn is_plain(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn ident(name: &str, options: ScriptOptions) -> String {
    if options.quote_identifiers && !is_plain(name) {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

/// Generate the migration script with default options
pub fn generate(accepted: &[MappingResult]) -> String {
    generate_with(accepted, ScriptOptions::default())
}

/// One commented `INSERT ... SELECT` per target table, separated by a blank line
pub fn generate_with(accepted: &[MappingResult], options: ScriptOptions) -> String {
    let statements: Vec<String> = group_by_target(accepted)
        .iter()
        .map(|group| {
            let modern_columns: Vec<String> = group
                .mappings
                .iter()
                .map(|m| ident(&m.modern_column, options))
                .collect();
            let legacy_columns: Vec<String> = group
                .mappings
                .iter()
                .map(|m| {
                    format!(
                        "{}.{}",
                        ident(&m.legacy_table, options),
                        ident(&m.legacy_column, options)
                    )
                })
                .collect();
            format!(
                "-- Mapping for {table}\nINSERT INTO {target} ({columns})\nSELECT {sources}\nFROM {from};\n",
                table = group.modern_table,
                target = ident(group.modern_table, options),
                columns = modern_columns.join(", "),
                sources = legacy_columns.join(", "),
                from = ident(&group.mappings[0].legacy_table, options),
            )
        })
        .collect();

    statements.join("\n")
}

/// Row-count queries for every target table, to run after the migration
pub fn generate_validation(accepted: &[MappingResult], options: ScriptOptions) -> String {
    let groups = group_by_target(accepted);
    if groups.is_empty() {
        return String::new();
    }

    let mut script = String::from("-- Validation queries for migration\n");
    script.push_str("-- Run these after migration to verify data integrity\n\n");
    for group in groups {
        script.push_str(&format!(
            "SELECT COUNT(*) AS {} FROM {};\n",
            ident(&format!("{}_count", group.modern_table), options),
            ident(group.modern_table, options)
        ));
    }
    script
}
