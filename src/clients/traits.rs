use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// One generation call against a hosted model
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest {
    pub prompt: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
}

impl InferenceRequest {
    pub fn new(prompt: impl Into<String>, max_new_tokens: u32, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            max_new_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("model access requires accepting its terms: {0}")]
    Gated(String),
    #[error("model not found: {0}")]
    NotFound(String),
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("empty response from model")]
    EmptyResponse,
}

/// Coarse failure class driving the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Unauthorized,
    ModelUnavailable,
    Other,
}

impl InferenceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            InferenceError::RateLimited(_) => FailureKind::RateLimited,
            InferenceError::Unauthorized(_) => FailureKind::Unauthorized,
            InferenceError::Gated(_) | InferenceError::NotFound(_) => {
                FailureKind::ModelUnavailable
            }
            InferenceError::Timeout { .. }
            | InferenceError::Http { .. }
            | InferenceError::Transport(_)
            | InferenceError::EmptyResponse => FailureKind::Other,
        }
    }

    /// Map an HTTP error status and body onto an error variant.
    pub fn from_status(status: u16, body: &str) -> Self {
        let snippet: String = body.chars().take(200).collect();
        match status {
            429 => InferenceError::RateLimited(snippet),
            401 => InferenceError::Unauthorized(snippet),
            403 => InferenceError::Gated(snippet),
            404 => InferenceError::NotFound(snippet),
            _ if body.to_lowercase().contains("rate limit") => InferenceError::RateLimited(snippet),
            _ => InferenceError::Http {
                status,
                body: snippet,
            },
        }
    }
}

/// Seam to the hosted inference service
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Send one request to `model` and return the raw generated text.
    async fn generate(
        &self,
        model: &str,
        request: &InferenceRequest,
    ) -> Result<String, InferenceError>;
}
