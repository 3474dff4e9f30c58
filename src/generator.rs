//! Outline generation pipeline
//!
//! classify -> prompt -> remote call (bounded retry) -> parse/validate, with
//! the template outline standing in whenever any stage fails. Generation
//! itself never returns an error: the worst case is a template outline plus
//! a [`FallbackReason`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::classifier::{ArticleType, classify};
use crate::clients::{FailureKind, HuggingFaceClient, InferenceBackend, InferenceRequest};
use crate::config::GenerationConfig;
use crate::error::FallbackReason;
use crate::export::export_file_name;
use crate::format::format_outline;
use crate::outline::Outline;
use crate::parse::parse_response;
use crate::prompts::{PROBE_PROMPT, build_prompt};
use crate::templates::generate_template;

/// Hard ceiling on remote attempts per generation
pub const MAX_ATTEMPTS: u32 = 2;

/// Token budget for the model probe
pub const PROBE_MAX_NEW_TOKENS: u32 = 5;

/// Backoff applied before retrying a rate-limited request
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub rate_limit_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            rate_limit_backoff: config.rate_limit_backoff(),
        }
    }
}

/// Result of the bounded remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    Success(String),
    Fallback(FallbackReason),
}

/// Where an outline came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutlineSource {
    Model { model: String },
    Template,
}

/// One completed generation request
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub topic: String,
    pub keyword: String,
    pub article_type: ArticleType,
    pub outline: Outline,
    pub source: OutlineSource,
    #[serde(skip)]
    pub fallback: Option<FallbackReason>,
    pub generated_at: DateTime<Utc>,
}

impl Generation {
    fn template(topic: &str, keyword: &str, reason: Option<FallbackReason>) -> Self {
        if let Some(r) = &reason {
            info!("using template outline: {}", r.code());
        }
        Self {
            topic: topic.to_string(),
            keyword: keyword.to_string(),
            article_type: classify(topic),
            outline: generate_template(topic, keyword),
            source: OutlineSource::Template,
            fallback: reason,
            generated_at: Utc::now(),
        }
    }

    /// Formatted text, identical for display and export
    pub fn text(&self) -> String {
        format_outline(&self.outline)
    }

    pub fn file_name(&self) -> String {
        export_file_name(&self.topic)
    }

    /// True when the user has to supply or replace their token
    pub fn credential_error(&self) -> bool {
        self.fallback
            .as_ref()
            .is_some_and(FallbackReason::is_credential_error)
    }
}

/// Informational note about the model family in use
pub fn model_note(model: &str) -> Option<&'static str> {
    let lower = model.to_lowercase();
    if lower.contains("llama") {
        Some("Using Llama model - best quality!")
    } else if lower.contains("flan-t5") {
        Some("Using FLAN-T5 - good quality fallback")
    } else {
        None
    }
}

/// Call the backend at most [`MAX_ATTEMPTS`] times, retrying only on rate limits.
pub async fn request_with_retry(
    backend: &dyn InferenceBackend,
    model: &str,
    request: &InferenceRequest,
    policy: &RetryPolicy,
) -> RemoteOutcome {
    let mut attempt = 0;
    loop {
        attempt += 1;
        debug!("generation attempt {}/{} on {}", attempt, MAX_ATTEMPTS, model);

        let err = match backend.generate(model, request).await {
            Ok(text) => return RemoteOutcome::Success(text),
            Err(e) => e,
        };
        warn!("generation attempt {} failed: {}", attempt, err);

        let reason = match err.kind() {
            FailureKind::RateLimited if attempt < MAX_ATTEMPTS => {
                info!(
                    "rate limited, retrying in {}ms",
                    policy.rate_limit_backoff.as_millis()
                );
                tokio::time::sleep(policy.rate_limit_backoff).await;
                continue;
            }
            FailureKind::RateLimited => FallbackReason::RateLimited,
            FailureKind::Unauthorized => FallbackReason::Unauthorized,
            FailureKind::ModelUnavailable => FallbackReason::ModelUnavailable {
                detail: format!("{model}: {err}"),
            },
            FailureKind::Other => FallbackReason::GenericRemoteFailure {
                detail: err.to_string(),
            },
        };
        return RemoteOutcome::Fallback(reason);
    }
}

/// Find the first configured model that answers a short probe.
///
/// A rejected token stops the search; gated, missing or failing models are
/// skipped.
pub async fn probe_models(
    backend: &dyn InferenceBackend,
    models: &[String],
) -> Result<String, FallbackReason> {
    let probe = InferenceRequest::new(PROBE_PROMPT, PROBE_MAX_NEW_TOKENS, 0.7);
    for model in models {
        info!("testing model {}", model);
        match backend.generate(model, &probe).await {
            Ok(_) => {
                info!("connected to {}", model);
                return Ok(model.clone());
            }
            Err(e) => match e.kind() {
                FailureKind::Unauthorized => {
                    warn!("token rejected while probing {}", model);
                    return Err(FallbackReason::Unauthorized);
                }
                FailureKind::ModelUnavailable => {
                    warn!(
                        "{} unavailable ({}); accept its terms at https://huggingface.co/{} if it is gated",
                        model, e, model
                    );
                }
                _ => warn!("{} failed probe: {}", model, e),
            },
        }
    }
    Err(FallbackReason::ModelUnavailable {
        detail: "no configured model answered".to_string(),
    })
}

/// Session-scoped generator: owns the backend and remembers the model that answered.
pub struct OutlineGenerator {
    backend: Option<Arc<dyn InferenceBackend>>,
    models: Vec<String>,
    probe_models: bool,
    max_new_tokens: u32,
    temperature: f32,
    retry: RetryPolicy,
    working_model: Mutex<Option<String>>,
}

impl OutlineGenerator {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: &GenerationConfig) -> Self {
        Self {
            backend: Some(backend),
            ..Self::offline(config)
        }
    }

    /// Generator without a credential: always produces template outlines.
    pub fn offline(config: &GenerationConfig) -> Self {
        Self {
            backend: None,
            models: config.models.clone(),
            probe_models: config.probe_models,
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            retry: RetryPolicy::from_config(config),
            working_model: Mutex::new(None),
        }
    }

    /// Hugging Face backed generator when a token is present, offline otherwise.
    pub fn from_token(token: Option<&str>, config: &GenerationConfig) -> anyhow::Result<Self> {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => {
                let client = HuggingFaceClient::new(token, config)?;
                Ok(Self::new(Arc::new(client), config))
            }
            None => Ok(Self::offline(config)),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.backend.is_some()
    }

    /// Model chosen for this session, probing on first use.
    pub async fn working_model(&self) -> Result<String, FallbackReason> {
        let backend = self.backend.as_ref().ok_or(FallbackReason::NoCredential)?;

        let mut cached = self.working_model.lock().await;
        if let Some(model) = cached.as_ref() {
            return Ok(model.clone());
        }

        let model = if self.probe_models {
            probe_models(backend.as_ref(), &self.models).await?
        } else {
            self.models
                .first()
                .cloned()
                .ok_or_else(|| FallbackReason::ModelUnavailable {
                    detail: "no models configured".to_string(),
                })?
        };
        if let Some(note) = model_note(&model) {
            info!("{}", note);
        }
        *cached = Some(model.clone());
        Ok(model)
    }

    /// Generate an outline for `topic`, falling back to the template on any failure.
    pub async fn generate(&self, topic: &str, keyword: &str) -> Generation {
        let article_type = classify(topic);
        info!("detected article type {} for topic", article_type);

        let Some(backend) = self.backend.as_ref() else {
            return Generation::template(topic, keyword, Some(FallbackReason::NoCredential));
        };

        let model = match self.working_model().await {
            Ok(m) => m,
            Err(reason) => return Generation::template(topic, keyword, Some(reason)),
        };

        let request = InferenceRequest::new(
            build_prompt(topic, keyword, article_type),
            self.max_new_tokens,
            self.temperature,
        );

        let raw = match request_with_retry(backend.as_ref(), &model, &request, &self.retry).await
        {
            RemoteOutcome::Success(raw) => raw,
            RemoteOutcome::Fallback(reason) => {
                return Generation::template(topic, keyword, Some(reason));
            }
        };

        match parse_response(&raw) {
            Some(outline) => Generation {
                topic: topic.to_string(),
                keyword: keyword.to_string(),
                article_type,
                outline,
                source: OutlineSource::Model { model },
                fallback: None,
                generated_at: Utc::now(),
            },
            None => Generation::template(topic, keyword, Some(FallbackReason::MalformedResponse)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_notes() {
        assert!(model_note("meta-llama/Llama-3.2-3B-Instruct").unwrap().contains("Llama"));
        assert!(model_note("google/flan-t5-base").unwrap().contains("FLAN-T5"));
        assert!(model_note("mistralai/Mistral-7B").is_none());
    }

    #[tokio::test]
    async fn offline_generator_uses_template() {
        let generator = OutlineGenerator::offline(&GenerationConfig::default());
        assert!(!generator.has_credential());
        let generation = generator.generate("how to bake bread", "").await;
        assert_eq!(generation.source, OutlineSource::Template);
        assert_eq!(generation.fallback, Some(FallbackReason::NoCredential));
        assert!(generation.credential_error());
        assert_eq!(generation.outline, generate_template("how to bake bread", ""));
    }

    #[tokio::test]
    async fn blank_token_is_offline() {
        let generator =
            OutlineGenerator::from_token(Some("   "), &GenerationConfig::default()).unwrap();
        assert!(!generator.has_credential());
        assert_eq!(
            generator.working_model().await,
            Err(FallbackReason::NoCredential)
        );
    }
}
