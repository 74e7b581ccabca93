use serde::{Deserialize, Serialize};

/// Which kind of target-schema document a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Table,
    Column,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    pub kind: CandidateKind,
    pub table_name: String,
    pub column_name: Option<String>,
    pub data_type: Option<String>,
}

/// A target-schema item retrieved for a query.
///
/// `score` is the distance from the query: lower means a closer match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub content: String,
    pub metadata: CandidateMetadata,
    pub score: f32,
}

impl CandidateMatch {
    /// `table.column`, with `unknown` standing in for a missing column
    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}",
            self.metadata.table_name,
            self.metadata.column_name.as_deref().unwrap_or("unknown")
        )
    }

    /// One prompt line: `table.column (type) - score: N.NNN`
    pub fn prompt_line(&self) -> String {
        format!(
            "{} ({}) - score: {:.3}",
            self.qualified_name(),
            self.metadata.data_type.as_deref().unwrap_or("unknown"),
            self.score
        )
    }
}
