//! External reasoning service: a text-in, text-out completion call.

use std::thread;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{RetryPolicy, ServiceConfig};

/// Errors from a networked collaborator (reasoning or embedding service).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Network failure or timeout.
    #[error("service unavailable: {0}")]
    Transient(String),

    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// Whether another attempt could plausibly succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::MalformedResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Rejected {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transient(err.to_string())
        }
    }
}

/// Run `op`, retrying retryable failures up to the policy's budget
pub fn with_retry<T, F>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, ServiceError>
where
    F: FnMut() -> Result<T, ServiceError>,
{
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                warn!(
                    "{} failed (attempt {}), retrying in {:?}: {}",
                    what,
                    attempt + 1,
                    delay,
                    err
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Text completion capability used by the verification resolver.
pub trait ReasoningService: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

impl<S: ReasoningService + ?Sized> ReasoningService for Box<S> {
    fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        (**self).complete(prompt)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible `chat/completions` client with timeout and bounded retry
pub struct HttpReasoningService {
    client: Client,
    config: ServiceConfig,
}

impl HttpReasoningService {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Transient(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn complete_once(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = json!({
            "model": self.config.model,
            "temperature": 0.1,
            "messages": [ChatMessage { role: "user", content: prompt }],
        });

        let mut request = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .header(CONTENT_TYPE, "application/json")
            .json(&body);
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

        let parsed: ChatResponse = response.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::MalformedResponse("completion has no content".to_string()))
    }
}

impl ReasoningService for HttpReasoningService {
    fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        debug!(model = %self.config.model, "requesting completion");
        with_retry(&self.config.retry, "completion request", || {
            self.complete_once(prompt)
        })
    }
}
