//! Mapping engine: candidate retrieval, resolution and threshold filtering
//! for every column of a legacy snapshot.

use std::fmt;
use std::sync::{mpsc, Mutex};
use std::thread;

use tracing::{debug, info, warn};

use crate::config::MappingConfig;
use crate::error::{MapperError, Result};
use crate::index::{CandidateIndex, IndexError};
use crate::resolve::Resolver;
use crate::types::{LegacyItem, MappingResult, SchemaMapping, SchemaSnapshot};

/// Why a column ended up unmapped
#[derive(Debug, Clone, PartialEq)]
pub enum UnmappedReason {
    /// The index returned nothing for the column.
    NoCandidates,
    /// Candidate retrieval failed for this column only.
    LookupFailed(String),
    /// The resolver could not decide.
    Undecidable,
    /// A result was produced but did not clear the acceptance threshold.
    BelowThreshold(f64),
}

impl fmt::Display for UnmappedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidates => write!(f, "no candidates"),
            Self::LookupFailed(err) => write!(f, "candidate lookup failed: {}", err),
            Self::Undecidable => write!(f, "undecidable"),
            Self::BelowThreshold(confidence) => {
                write!(f, "confidence {:.2} at or below threshold", confidence)
            }
        }
    }
}

/// Outcome for one legacy column
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Accepted(MappingResult),
    Unmapped(LegacyItem, UnmappedReason),
}

/// A unit of work sent to a resolution worker
struct Job {
    position: usize,
    item: LegacyItem,
}

pub struct MappingEngine<'a> {
    resolver: &'a dyn Resolver,
    index: Option<&'a CandidateIndex>,
    config: MappingConfig,
}

impl<'a> MappingEngine<'a> {
    pub fn new(resolver: &'a dyn Resolver) -> Self {
        Self {
            resolver,
            index: None,
            config: MappingConfig::default(),
        }
    }

    pub fn with_index(mut self, index: &'a CandidateIndex) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_config(mut self, config: MappingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config = self.config.with_workers(workers);
        self
    }

    /// Map every column of `snapshot`.
    ///
    /// Only a missing or unbuilt index is fatal. Per-column failures become
    /// entries in `unmapped_items`. Output order is table then column
    /// declaration order regardless of worker count.
    pub fn map(&self, snapshot: &SchemaSnapshot) -> Result<SchemaMapping> {
        if self.resolver.needs_candidates() {
            match self.index {
                Some(index) if index.is_ready() => {}
                _ => {
                    return Err(MapperError::NotReady(format!(
                        "resolver '{}' needs a built candidate index",
                        self.resolver.name()
                    )))
                }
            }
        }

        let items = snapshot.items();
        info!(
            resolver = self.resolver.name(),
            tables = snapshot.tables.len(),
            columns = items.len(),
            workers = self.config.workers,
            "starting schema mapping"
        );

        let decisions = if self.config.workers <= 1 || items.len() <= 1 {
            let mut decisions = Vec::with_capacity(items.len());
            let mut current_table: Option<&str> = None;
            for item in &items {
                if current_table != Some(item.table.as_str()) {
                    info!(table = %item.table, "mapping table");
                    current_table = Some(item.table.as_str());
                }
                decisions.push(self.decide(item)?);
            }
            decisions
        } else {
            for table in &snapshot.tables {
                info!(table = %table.name, columns = table.columns.len(), "mapping table");
            }
            self.decide_parallel(items)?
        };

        let mapping = collect(decisions);
        info!(
            accepted = mapping.accepted.len(),
            unmapped = mapping.unmapped_items.len(),
            "schema mapping finished"
        );
        Ok(mapping)
    }

    /// Resolve one column; errors only on a fatal index state
    pub fn decide(&self, item: &LegacyItem) -> Result<Decision> {
        let candidates = if self.resolver.needs_candidates() {
            let index = self
                .index
                .ok_or_else(|| MapperError::NotReady("no candidate index".to_string()))?;
            match index.query(&item.search_text(), self.config.candidate_width) {
                Ok(candidates) => candidates,
                Err(IndexError::NotReady(collection)) => {
                    return Err(MapperError::NotReady(collection))
                }
                Err(IndexError::Embedding(err)) => {
                    warn!(item = %item, "candidate lookup failed: {}", err);
                    return Ok(Decision::Unmapped(
                        item.clone(),
                        UnmappedReason::LookupFailed(err.to_string()),
                    ));
                }
            }
        } else {
            Vec::new()
        };

        if self.resolver.needs_candidates() && candidates.is_empty() {
            debug!(item = %item, "no candidates");
            return Ok(Decision::Unmapped(item.clone(), UnmappedReason::NoCandidates));
        }

        let decision = match self.resolver.resolve(item, &candidates) {
            Some(mapping) if mapping.confidence_score > self.config.acceptance_threshold => {
                info!(
                    "{} -> {} (confidence: {:.2})",
                    item,
                    mapping.modern_qualified(),
                    mapping.confidence_score
                );
                Decision::Accepted(mapping)
            }
            Some(mapping) => {
                debug!(
                    item = %item,
                    confidence = mapping.confidence_score,
                    "below acceptance threshold"
                );
                Decision::Unmapped(
                    item.clone(),
                    UnmappedReason::BelowThreshold(mapping.confidence_score),
                )
            }
            None => {
                debug!(item = %item, "undecidable");
                Decision::Unmapped(item.clone(), UnmappedReason::Undecidable)
            }
        };
        Ok(decision)
    }

    /// Fan columns out over a bounded pool of scoped threads, then restore
    /// declaration order by position.
    fn decide_parallel(&self, items: Vec<LegacyItem>) -> Result<Vec<Decision>> {
        let total = items.len();
        let workers = self.config.workers.min(total);
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (result_tx, result_rx) = mpsc::channel::<(usize, Result<Decision>)>();
        let job_rx = Mutex::new(job_rx);

        for (position, item) in items.into_iter().enumerate() {
            // Receiver outlives this loop, so sending cannot fail
            let _ = job_tx.send(Job { position, item });
        }
        drop(job_tx);

        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = &job_rx;
                let result_tx = result_tx.clone();
                scope.spawn(move || loop {
                    let job = match job_rx.lock() {
                        Ok(rx) => rx.recv(),
                        Err(_) => break,
                    };
                    match job {
                        Ok(Job { position, item }) => {
                            let _ = result_tx.send((position, self.decide(&item)));
                        }
                        // Queue drained
                        Err(_) => break,
                    }
                });
            }
        });
        drop(result_tx);

        let mut slots: Vec<Option<Decision>> = vec![None; total];
        for (position, decision) in result_rx {
            slots[position] = Some(decision?);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.ok_or_else(|| {
                    MapperError::Config(format!("worker pool lost column #{}", position))
                })
            })
            .collect()
    }
}

/// Fold ordered decisions into the final mapping
pub fn collect(decisions: Vec<Decision>) -> SchemaMapping {
    let mut mapping = SchemaMapping::default();
    for decision in decisions {
        match decision {
            Decision::Accepted(result) => mapping.accepted.push(result),
            Decision::Unmapped(item, reason) => {
                let key = item.to_string();
                mapping.unmapped_reasons.insert(key.clone(), reason.to_string());
                mapping.unmapped_items.push(key);
            }
        }
    }
    mapping
}
