//! Resolution of one legacy column to at most one modern column.

pub mod rules;
pub mod service;
pub mod verify;

use crate::types::{CandidateMatch, LegacyItem, MappingResult};

pub use rules::{CustomRule, RuleResolver, RuleTable};
pub use service::{HttpReasoningService, ReasoningService, ServiceError};
pub use verify::VerificationResolver;

/// Capability shared by the rule-table and verification strategies.
///
/// `None` means undecidable; the engine records the column as unmapped.
/// Implementations never panic on bad external input and must be safe to
/// call from several worker threads.
pub trait Resolver: Send + Sync {
    /// Short strategy name for logs
    fn name(&self) -> &'static str;

    /// Whether the engine must query the candidate index before calling `resolve`
    fn needs_candidates(&self) -> bool;

    fn resolve(&self, item: &LegacyItem, candidates: &[CandidateMatch]) -> Option<MappingResult>;
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn needs_candidates(&self) -> bool {
        (**self).needs_candidates()
    }

    fn resolve(&self, item: &LegacyItem, candidates: &[CandidateMatch]) -> Option<MappingResult> {
        (**self).resolve(item, candidates)
    }
}
