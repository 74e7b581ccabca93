pub mod candidate;
pub mod mapping;
pub mod table;

pub use candidate::{CandidateKind, CandidateMatch, CandidateMetadata};
pub use mapping::{MappingResult, SchemaMapping};
pub use table::{ColumnInfo, LegacyItem, SchemaSnapshot, TableInfo};
