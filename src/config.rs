//! Runtime settings for the mapping pipeline and its external services.

use std::time::Duration;

/// Results at or below this confidence are treated as noise.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.5;

/// Number of candidates retrieved from the index per legacy column.
pub const CANDIDATE_WIDTH: usize = 5;

/// Number of retrieved candidates shown to the reasoning service.
pub const PROMPT_CANDIDATES: usize = 3;

/// Context note sent with every verification prompt.
pub const DEFAULT_CONTEXT: &str =
    "Legacy system uses abbreviated, non-English naming and obscure conventions.";

/// Settings for one mapping run
#[derive(Debug, Clone)]
pub struct MappingConfig {
    pub acceptance_threshold: f64,
    pub candidate_width: usize,
    pub prompt_candidates: usize,
    /// Concurrent resolutions; `1` resolves inline on the calling thread
    pub workers: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: ACCEPTANCE_THRESHOLD,
            candidate_width: CANDIDATE_WIDTH,
            prompt_candidates: PROMPT_CANDIDATES,
            workers: 1,
        }
    }
}

impl MappingConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Connection settings for an HTTP-backed service (reasoning or embeddings)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.example.com/v1`
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `base_url` joined with `path`, tolerating a trailing slash
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = MappingConfig::default();
        assert_eq!(config.acceptance_threshold, 0.5);
        assert_eq!(config.candidate_width, 5);
        assert_eq!(config.prompt_candidates, 3);
        assert_eq!(config.workers, 1);
        assert_eq!(MappingConfig::default().with_workers(0).workers, 1);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn test_endpoint_join() {
        let config = ServiceConfig::new("http://localhost:8080/v1/", "m");
        assert_eq!(
            config.endpoint("chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }
}
