//! Text embedding backends for the candidate index.

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::resolve::service::{with_retry, ServiceError};

/// Turns texts into fixed-length vectors
pub trait Embedder: Send + Sync {
    fn name(&self) -> &'static str;

    /// One vector per input text, in input order
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError>;
}

/// Dimension of [`TrigramEmbedder`] vectors.
pub const TRIGRAM_DIM: usize = 256;

/// Offline embedder: hashed character trigrams plus whole-token features.
///
/// Deterministic and network-free. Texts sharing abbreviations or word
/// fragments land close together.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrigramEmbedder;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

impl TrigramEmbedder {
    pub fn embed_one(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; TRIGRAM_DIM];
        let lowered = text.to_lowercase();

        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            vector[(fnv1a(token.as_bytes()) % TRIGRAM_DIM as u64) as usize] += 2.0;

            let padded: Vec<char> = format!(" {} ", token).chars().collect();
            for window in padded.windows(3) {
                let gram: String = window.iter().collect();
                vector[(fnv1a(gram.as_bytes()) % TRIGRAM_DIM as u64) as usize] += 1.0;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Embedder for TrigramEmbedder {
    fn name(&self) -> &'static str {
        "trigram"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI-compatible `embeddings` client with timeout and bounded retry
pub struct HttpEmbedder {
    client: Client,
    config: ServiceConfig,
}

impl HttpEmbedder {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Transient(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn embed_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        let mut request = self
            .client
            .post(self.config.endpoint("embeddings"))
            .json(&json!({ "model": self.config.model, "input": texts }));
        if let Some(key) = &self.config.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_else(|_| "unknown error".to_string());
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let mut parsed: EmbeddingResponse = response.json()?;
        if parsed.data.len() != texts.len() {
            return Err(ServiceError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

impl Embedder for HttpEmbedder {
    fn name(&self) -> &'static str {
        "http"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = texts.len(), model = %self.config.model, "requesting embeddings");
        with_retry(&self.config.retry, "embedding request", || self.embed_once(texts))
    }
}

/// Cosine distance, `1 - cos(a, b)`; zero vectors are maximally distant
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let nb = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    1.0 - dot / (na * nb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigram_is_deterministic_and_normalised() {
        let a = TrigramEmbedder::embed_one("column full_name in table customers");
        let b = TrigramEmbedder::embed_one("column full_name in table customers");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_fragments_are_closer() {
        let query = TrigramEmbedder::embed_one("database column field tb_prod_cat.nm_prod");
        let near = TrigramEmbedder::embed_one("column product_name in table products - type TEXT");
        let far = TrigramEmbedder::embed_one("column birth_date in table customers - type DATE");
        assert!(cosine_distance(&query, &near) < cosine_distance(&query, &far));
    }

    #[test]
    fn test_cosine_distance_bounds() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}
