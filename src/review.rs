//! Review session state for a human approving mapping suggestions.
//!
//! Holds the suggestions of one run, the approved subset, and custom rename
//! rules the reviewer wants applied to the next rule-based run. Nothing here
//! is global; the review surface owns a `ReviewSession` and passes it around.

use crate::resolve::{CustomRule, RuleTable};
use crate::types::{MappingResult, SchemaMapping};

/// Confidence above which bulk approval picks a suggestion.
pub const HIGH_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    suggestions: Vec<MappingResult>,
    unmapped_items: Vec<String>,
    /// Indices into `suggestions`, kept sorted
    approved: Vec<usize>,
    custom_rules: Vec<CustomRule>,
}

impl ReviewSession {
    pub fn new(mapping: SchemaMapping) -> Self {
        Self {
            suggestions: mapping.accepted,
            unmapped_items: mapping.unmapped_items,
            approved: Vec::new(),
            custom_rules: Vec::new(),
        }
    }

    pub fn suggestions(&self) -> &[MappingResult] {
        &self.suggestions
    }

    pub fn unmapped_items(&self) -> &[String] {
        &self.unmapped_items
    }

    pub fn is_approved(&self, index: usize) -> bool {
        self.approved.binary_search(&index).is_ok()
    }

    pub fn approved_count(&self) -> usize {
        self.approved.len()
    }

    /// Approve one suggestion; returns false when `index` is out of range
    pub fn approve(&mut self, index: usize) -> bool {
        if index >= self.suggestions.len() {
            return false;
        }
        if let Err(pos) = self.approved.binary_search(&index) {
            self.approved.insert(pos, index);
        }
        true
    }

    pub fn unapprove(&mut self, index: usize) {
        if let Ok(pos) = self.approved.binary_search(&index) {
            self.approved.remove(pos);
        }
    }

    /// Approve every suggestion above [`HIGH_CONFIDENCE`]; returns how many were new
    pub fn approve_high_confidence(&mut self) -> usize {
        let candidates: Vec<usize> = self
            .suggestions
            .iter()
            .enumerate()
            .filter(|(_, m)| m.confidence_score > HIGH_CONFIDENCE)
            .map(|(i, _)| i)
            .collect();
        let before = self.approved.len();
        for index in candidates {
            self.approve(index);
        }
        self.approved.len() - before
    }

    /// Human edit of a suggestion's target; returns false when `index` is out of range
    pub fn override_target(
        &mut self,
        index: usize,
        modern_table: impl Into<String>,
        modern_column: impl Into<String>,
    ) -> bool {
        match self.suggestions.get_mut(index) {
            Some(mapping) => {
                mapping.modern_table = modern_table.into();
                mapping.modern_column = modern_column.into();
                true
            }
            None => false,
        }
    }

    /// Drop every approval; suggestions and rules stay
    pub fn reset(&mut self) {
        self.approved.clear();
    }

    /// Add or replace the rule for `pattern`
    pub fn add_custom_rule(&mut self, pattern: impl Into<String>, replacement: impl Into<String>) {
        let rule = CustomRule::new(pattern, replacement);
        match self.custom_rules.iter_mut().find(|r| r.pattern == rule.pattern) {
            Some(existing) => existing.replacement = rule.replacement,
            None => self.custom_rules.push(rule),
        }
    }

    pub fn remove_custom_rule(&mut self, pattern: &str) -> bool {
        let before = self.custom_rules.len();
        self.custom_rules.retain(|r| r.pattern != pattern);
        self.custom_rules.len() != before
    }

    pub fn custom_rules(&self) -> &[CustomRule] {
        &self.custom_rules
    }

    /// `base` with this session's custom rules applied
    pub fn rule_table(&self, base: &RuleTable) -> RuleTable {
        base.with_custom_rules(&self.custom_rules)
    }

    /// Approved mappings in suggestion order, ready for script generation
    pub fn approved(&self) -> Vec<MappingResult> {
        self.approved
            .iter()
            .map(|&i| self.suggestions[i].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(column: &str, confidence: f64) -> MappingResult {
        MappingResult {
            legacy_table: "tb_cli_reg".to_string(),
            legacy_column: column.to_string(),
            modern_table: "customers".to_string(),
            modern_column: format!("{}_new", column),
            confidence_score: confidence,
            transformation_logic: String::new(),
            reasoning: String::new(),
        }
    }

    fn session() -> ReviewSession {
        ReviewSession::new(SchemaMapping {
            accepted: vec![
                suggestion("a", 0.9),
                suggestion("b", 0.6),
                suggestion("c", 0.85),
            ],
            unmapped_items: vec!["tb_cli_reg.z".to_string()],
            ..SchemaMapping::default()
        })
    }

    #[test]
    fn test_approve_is_idempotent_and_ordered() {
        let mut session = session();
        assert!(session.approve(2));
        assert!(session.approve(0));
        assert!(session.approve(2));
        assert!(!session.approve(7));
        let approved: Vec<String> = session
            .approved()
            .into_iter()
            .map(|m| m.legacy_column)
            .collect();
        assert_eq!(approved, vec!["a", "c"]);
    }

    #[test]
    fn test_bulk_approval_and_reset() {
        let mut session = session();
        session.approve(0);
        assert_eq!(session.approve_high_confidence(), 1);
        assert_eq!(session.approved_count(), 2);
        assert!(!session.is_approved(1));
        session.reset();
        assert_eq!(session.approved_count(), 0);
        assert_eq!(session.suggestions().len(), 3);
    }

    #[test]
    fn test_override_flows_into_approved() {
        let mut session = session();
        assert!(session.override_target(1, "people", "nickname"));
        session.approve(1);
        let approved = session.approved();
        assert_eq!(approved[0].modern_table, "people");
        assert_eq!(approved[0].modern_column, "nickname");
        assert!(!session.override_target(9, "x", "y"));
    }

    #[test]
    fn test_custom_rules() {
        let mut session = session();
        session.add_custom_rule("dt_*", "*_date");
        session.add_custom_rule("dt_*", "*_on");
        session.add_custom_rule("id_cli", "customer_id");
        assert_eq!(session.custom_rules().len(), 2);

        let table = session.rule_table(&RuleTable::builtin());
        assert_eq!(table.column_rules["dt_nasc"], "nasc_on");
        assert_eq!(table.column_rules["id_cli"], "customer_id");

        assert!(session.remove_custom_rule("dt_*"));
        assert!(!session.remove_custom_rule("dt_*"));
    }
}
