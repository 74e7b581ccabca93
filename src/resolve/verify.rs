//! Candidate verification through an external reasoning service.
//!
//! The service's reply is untrusted input. It must be exactly one JSON
//! object with `best_match`, `confidence`, `transformation_logic` and
//! `reasoning`, each of the right type. Anything else makes the column
//! undecidable; it never aborts the run.

use serde::Deserialize;
use tracing::{debug, warn};

use super::service::{ReasoningService, ServiceError};
use super::Resolver;
use crate::config::{DEFAULT_CONTEXT, PROMPT_CANDIDATES};
use crate::types::{CandidateMatch, LegacyItem, MappingResult};

/// Expected reply shape. Unknown keys are ignored; missing or mistyped keys fail.
#[derive(Debug, Deserialize)]
struct Verdict {
    best_match: String,
    confidence: f64,
    transformation_logic: String,
    reasoning: String,
}

/// Build the verification prompt for one legacy item
pub fn build_prompt(
    item: &LegacyItem,
    candidates: &[CandidateMatch],
    context: &str,
    shown: usize,
) -> String {
    let candidate_lines: Vec<String> = candidates
        .iter()
        .take(shown)
        .map(|c| format!("- {}", c.prompt_line()))
        .collect();

    format!(
        r#"You are a database schema mapping expert. Decide which modern schema column the legacy column corresponds to.

Legacy Item: {item}
Modern Candidates:
{candidates}
Context: {context}

Consider semantic meaning of abbreviations (e.g. 'c_nom' = customer name, 'dt_nasc' = birth date), data type compatibility and business context.

Respond with ONLY a single JSON object and nothing else, in exactly this shape:
{{"best_match": "modern_table.modern_column", "confidence": 0.85, "transformation_logic": "Direct mapping", "reasoning": "Both hold the customer's full name as text"}}
"#,
        item = item,
        candidates = candidate_lines.join("\n"),
        context = context,
    )
}

/// Validate a raw reply and turn it into a mapping for `item`
pub fn parse_response(item: &LegacyItem, raw: &str) -> Result<MappingResult, ServiceError> {
    let verdict: Verdict = serde_json::from_str(raw.trim())
        .map_err(|e| ServiceError::MalformedResponse(format!("{}: {}", item, e)))?;

    let (modern_table, modern_column) = verdict
        .best_match
        .split_once('.')
        .filter(|(t, c)| !t.trim().is_empty() && !c.trim().is_empty())
        .ok_or_else(|| {
            ServiceError::MalformedResponse(format!(
                "{}: best_match '{}' is not table.column",
                item, verdict.best_match
            ))
        })?;

    if !(0.0..=1.0).contains(&verdict.confidence) {
        return Err(ServiceError::MalformedResponse(format!(
            "{}: confidence {} outside [0, 1]",
            item, verdict.confidence
        )));
    }

    Ok(MappingResult {
        legacy_table: item.table.clone(),
        legacy_column: item.column.clone(),
        modern_table: modern_table.trim().to_string(),
        modern_column: modern_column.trim().to_string(),
        confidence_score: verdict.confidence,
        transformation_logic: verdict.transformation_logic,
        reasoning: verdict.reasoning,
    })
}

/// Resolver that asks a [`ReasoningService`] to pick among retrieved candidates
pub struct VerificationResolver<S> {
    service: S,
    context: String,
    prompt_candidates: usize,
}

impl<S: ReasoningService> VerificationResolver<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            context: DEFAULT_CONTEXT.to_string(),
            prompt_candidates: PROMPT_CANDIDATES,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Ask the service and validate its reply, surfacing the failure kind
    pub fn verify(
        &self,
        item: &LegacyItem,
        candidates: &[CandidateMatch],
    ) -> Result<MappingResult, ServiceError> {
        let prompt = build_prompt(item, candidates, &self.context, self.prompt_candidates);
        let raw = self.service.complete(&prompt)?;
        debug!(item = %item, "verification reply received");
        parse_response(item, &raw)
    }
}

impl<S: ReasoningService> Resolver for VerificationResolver<S> {
    fn name(&self) -> &'static str {
        "verified"
    }

    fn needs_candidates(&self) -> bool {
        true
    }

    fn resolve(&self, item: &LegacyItem, candidates: &[CandidateMatch]) -> Option<MappingResult> {
        if candidates.is_empty() {
            return None;
        }
        match self.verify(item, candidates) {
            Ok(mapping) => Some(mapping),
            Err(err @ ServiceError::MalformedResponse(_)) => {
                warn!(item = %item, "discarding reasoning reply: {}", err);
                None
            }
            Err(err) => {
                warn!(item = %item, "reasoning service failed: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CandidateKind, CandidateMetadata};

    fn candidate(table: &str, column: &str, score: f32) -> CandidateMatch {
        CandidateMatch {
            content: format!("column {} in table {} - type TEXT", column, table),
            metadata: CandidateMetadata {
                kind: CandidateKind::Column,
                table_name: table.to_string(),
                column_name: Some(column.to_string()),
                data_type: Some("TEXT".to_string()),
            },
            score,
        }
    }

    #[test]
    fn test_prompt_shows_top_three() {
        let item = LegacyItem::new("tb_cli_reg", "c_nom");
        let candidates = vec![
            candidate("customers", "full_name", 0.12),
            candidate("customers", "email_address", 0.4),
            candidate("orders", "order_status", 0.5),
            candidate("products", "product_name", 0.6),
        ];
        let prompt = build_prompt(&item, &candidates, "ctx note", 3);
        assert!(prompt.contains("Legacy Item: tb_cli_reg.c_nom"));
        assert!(prompt.contains("- customers.full_name (TEXT) - score: 0.120"));
        assert!(prompt.contains("- orders.order_status (TEXT) - score: 0.500"));
        assert!(!prompt.contains("products.product_name"));
        assert!(prompt.contains("Context: ctx note"));
    }

    #[test]
    fn test_parse_valid_reply() {
        let item = LegacyItem::new("tb_cli_reg", "c_nom");
        let raw = r#" {"best_match": "customers.full_name", "confidence": 0.92,
            "transformation_logic": "Direct mapping", "reasoning": "name", "extra": 1} "#;
        let mapping = parse_response(&item, raw).unwrap();
        assert_eq!(mapping.modern_table, "customers");
        assert_eq!(mapping.modern_column, "full_name");
        assert!((mapping.confidence_score - 0.92).abs() < 1e-12);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        let item = LegacyItem::new("t", "c");
        let cases = [
            "not json at all",
            r#"{"best_match": "customers.full_name", "confidence": 0.9, "reasoning": "x"}"#,
            r#"{"best_match": "full_name", "confidence": 0.9, "transformation_logic": "", "reasoning": ""}"#,
            r#"{"best_match": "customers.full_name", "confidence": "high", "transformation_logic": "", "reasoning": ""}"#,
            r#"{"best_match": "customers.full_name", "confidence": 1.5, "transformation_logic": "", "reasoning": ""}"#,
            r#"{"best_match": 42, "confidence": 0.9, "transformation_logic": "", "reasoning": ""}"#,
            r#"["customers.full_name", 0.9]"#,
            r#"{"best_match": "a.b", "confidence": 0.9, "transformation_logic": "", "reasoning": ""} trailing"#,
        ];
        for raw in cases {
            assert!(
                matches!(parse_response(&item, raw), Err(ServiceError::MalformedResponse(_))),
                "accepted: {}",
                raw
            );
        }
    }
}
