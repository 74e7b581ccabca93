//! Human-readable summaries of a mapping run.

use std::fmt::Write as _;

use serde::Serialize;

use crate::resolve::rules::suggest_transformations;
use crate::types::SchemaMapping;

/// Counts for the end-of-run report.
///
/// Bands: high is above 0.8, medium is 0.5 through 0.8, low is below 0.5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MappingSummary {
    pub accepted: usize,
    pub unmapped: usize,
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
}

impl MappingSummary {
    pub fn from_mapping(mapping: &SchemaMapping) -> Self {
        let mut summary = Self {
            accepted: mapping.accepted.len(),
            unmapped: mapping.unmapped_items.len(),
            ..Self::default()
        };
        for m in &mapping.accepted {
            let c = m.confidence_score;
            if c > 0.8 {
                summary.high_confidence += 1;
            } else if c >= 0.5 {
                summary.medium_confidence += 1;
            } else {
                summary.low_confidence += 1;
            }
        }
        summary
    }

    /// `Accepted: N  Unmapped: M`
    pub fn headline(&self) -> String {
        format!("Accepted: {}  Unmapped: {}", self.accepted, self.unmapped)
    }
}

/// Markdown mapping report: summary, one section per accepted mapping, then the unmapped list
pub fn render_markdown(mapping: &SchemaMapping) -> String {
    let summary = MappingSummary::from_mapping(mapping);
    let mut out = String::new();

    let _ = writeln!(out, "# Schema Mapping Report\n");
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out, "- Accepted mappings: {}", summary.accepted);
    let _ = writeln!(out, "- Unmapped items: {}", summary.unmapped);
    let _ = writeln!(out, "- High confidence (>0.8): {}", summary.high_confidence);
    let _ = writeln!(out, "- Medium confidence (0.5-0.8): {}", summary.medium_confidence);
    let _ = writeln!(out, "- Low confidence (<0.5): {}", summary.low_confidence);

    if !mapping.accepted.is_empty() {
        let _ = writeln!(out, "\n## Mappings");
        for m in &mapping.accepted {
            let _ = writeln!(
                out,
                "\n### {} → {}",
                m.legacy_qualified(),
                m.modern_qualified()
            );
            let _ = writeln!(out, "- Confidence: {:.2}", m.confidence_score);
            let _ = writeln!(out, "- Reasoning: {}", m.reasoning);
            let _ = writeln!(out, "- Transformation: {}", m.transformation_logic);
            let notes = suggest_transformations(&m.legacy_column, &m.modern_column);
            if !notes.is_empty() {
                let _ = writeln!(out, "- Suggestions:");
                for note in notes {
                    let _ = writeln!(out, "  - {}", note);
                }
            }
        }
    }

    if !mapping.unmapped_items.is_empty() {
        let _ = writeln!(out, "\n## Unmapped");
        for item in &mapping.unmapped_items {
            match mapping.unmapped_reason(item) {
                Some(reason) => {
                    let _ = writeln!(out, "- {} ({})", item, reason);
                }
                None => {
                    let _ = writeln!(out, "- {}", item);
                }
            }
        }
    }

    out
}
