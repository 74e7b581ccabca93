//! Semantic index over a target schema's table and column descriptions.
//!
//! Each table contributes one table-level document and one document per
//! column. Collections are built completely and only then swapped in, so a
//! query never sees a partial index.

pub mod embed;

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::resolve::ServiceError;
use crate::types::{CandidateKind, CandidateMatch, CandidateMetadata, SchemaSnapshot};

pub use embed::{cosine_distance, Embedder, HttpEmbedder, TrigramEmbedder};

/// Collection used when callers don't name one.
pub const DEFAULT_COLLECTION: &str = "modern_schema";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("collection '{0}' has not been indexed")]
    NotReady(String),
    #[error("embedding failed: {0}")]
    Embedding(#[from] ServiceError),
}

/// A document ready to be embedded
#[derive(Debug, Clone)]
pub struct IndexDocument {
    pub content: String,
    pub metadata: CandidateMetadata,
}

/// Table document followed by one document per column, for every table in order
pub fn documents_for(snapshot: &SchemaSnapshot) -> Vec<IndexDocument> {
    let mut documents = Vec::new();
    for table in &snapshot.tables {
        documents.push(IndexDocument {
            content: table.description(),
            metadata: CandidateMetadata {
                kind: CandidateKind::Table,
                table_name: table.name.clone(),
                column_name: None,
                data_type: None,
            },
        });
        for column in &table.columns {
            documents.push(IndexDocument {
                content: column.document(&table.name),
                metadata: CandidateMetadata {
                    kind: CandidateKind::Column,
                    table_name: table.name.clone(),
                    column_name: Some(column.name.clone()),
                    data_type: Some(column.data_type.clone()),
                },
            });
        }
    }
    documents
}

struct Collection {
    documents: Vec<IndexDocument>,
    vectors: Vec<Vec<f32>>,
}

/// In-memory vector index with named collections
pub struct CandidateIndex {
    embedder: Box<dyn Embedder>,
    collections: HashMap<String, Collection>,
}

impl CandidateIndex {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self {
            embedder,
            collections: HashMap::new(),
        }
    }

    /// Index backed by the offline [`TrigramEmbedder`]
    pub fn offline() -> Self {
        Self::new(Box::new(TrigramEmbedder))
    }

    pub fn is_ready(&self) -> bool {
        self.is_collection_ready(DEFAULT_COLLECTION)
    }

    pub fn is_collection_ready(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    /// Index `snapshot` into the default collection
    pub fn index(&mut self, snapshot: &SchemaSnapshot) -> Result<usize, IndexError> {
        self.index_collection(DEFAULT_COLLECTION, snapshot)
    }

    /// Build `collection` from `snapshot`, replacing any previous contents.
    ///
    /// Returns the number of documents indexed. On failure the previous
    /// collection, if any, is left untouched.
    pub fn index_collection(
        &mut self,
        collection: &str,
        snapshot: &SchemaSnapshot,
    ) -> Result<usize, IndexError> {
        let documents = documents_for(snapshot);
        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = self.embedder.embed(&texts)?;
        if vectors.len() != documents.len() {
            return Err(IndexError::Embedding(ServiceError::MalformedResponse(format!(
                "expected {} vectors, got {}",
                documents.len(),
                vectors.len()
            ))));
        }

        let count = documents.len();
        self.collections
            .insert(collection.to_string(), Collection { documents, vectors });
        info!(
            collection,
            documents = count,
            embedder = self.embedder.name(),
            "indexed schema"
        );
        Ok(count)
    }

    /// Query the default collection
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<CandidateMatch>, IndexError> {
        self.query_collection(DEFAULT_COLLECTION, text, k)
    }

    /// Up to `k` matches, closest first; equal distances keep insertion order
    pub fn query_collection(
        &self,
        collection: &str,
        text: &str,
        k: usize,
    ) -> Result<Vec<CandidateMatch>, IndexError> {
        let entry = self
            .collections
            .get(collection)
            .ok_or_else(|| IndexError::NotReady(collection.to_string()))?;
        if k == 0 || entry.documents.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| {
                IndexError::Embedding(ServiceError::MalformedResponse(
                    "no vector for query".to_string(),
                ))
            })?;

        let mut scored: Vec<(usize, f32)> = entry
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_distance(&query_vector, v)))
            .collect();
        // Stable sort keeps declaration order among ties
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        let matches: Vec<CandidateMatch> = scored
            .into_iter()
            .take(k)
            .map(|(i, score)| {
                let doc = &entry.documents[i];
                CandidateMatch {
                    content: doc.content.clone(),
                    metadata: doc.metadata.clone(),
                    score,
                }
            })
            .collect();

        debug!(query = text, hits = matches.len(), "candidate query");
        Ok(matches)
    }
}
