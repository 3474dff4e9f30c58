use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

use crate::clients::traits::{InferenceBackend, InferenceError, InferenceRequest};
use crate::config::{ApiStyle, GenerationConfig};

/// Client for the Hugging Face Inference API
#[derive(Clone, Debug)]
pub struct HuggingFaceClient {
    api_base: String,
    api_style: ApiStyle,
    token: String,
    timeout: Duration,
    client: Client,
}

impl HuggingFaceClient {
    pub fn new(token: impl Into<String>, config: &GenerationConfig) -> anyhow::Result<Self> {
        let timeout = config.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build reqwest client with timeout: {e}"))?;

        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_style: config.api_style,
            token: token.into(),
            timeout,
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        match self.api_style {
            ApiStyle::TextGeneration => format!("{}/models/{}", self.api_base, model),
            ApiStyle::Chat => format!("{}/models/{}/v1/chat/completions", self.api_base, model),
        }
    }

    fn body(&self, model: &str, request: &InferenceRequest) -> Value {
        match self.api_style {
            ApiStyle::TextGeneration => json!({
                "inputs": request.prompt,
                "parameters": {
                    "max_new_tokens": request.max_new_tokens,
                    "temperature": request.temperature,
                    "return_full_text": false
                }
            }),
            ApiStyle::Chat => json!({
                "model": model,
                "messages": [
                    {"role": "user", "content": request.prompt}
                ],
                "max_tokens": request.max_new_tokens,
                "temperature": request.temperature
            }),
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            InferenceError::Transport(err.to_string())
        }
    }
}

/// Pull the generated text out of either response variant.
///
/// Text generation answers `[{"generated_text": ...}]` (sometimes a bare
/// object); chat answers `{"choices": [{"message": {"content": ...}}]}`.
pub fn extract_generated_text(value: &Value) -> Option<String> {
    let text = if let Some(first) = value.as_array().and_then(|a| a.first()) {
        first.get("generated_text").and_then(|t| t.as_str())
    } else if let Some(text) = value.get("generated_text").and_then(|t| t.as_str()) {
        Some(text)
    } else {
        value["choices"][0]["message"]["content"].as_str()
    };

    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[async_trait]
impl InferenceBackend for HuggingFaceClient {
    async fn generate(
        &self,
        model: &str,
        request: &InferenceRequest,
    ) -> Result<String, InferenceError> {
        let url = self.endpoint(model);
        tracing::debug!(
            "inference request (model={}, prompt_chars={}, max_new_tokens={})",
            model,
            request.prompt.len(),
            request.max_new_tokens
        );

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&self.body(model, request))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(InferenceError::from_status(status.as_u16(), &text));
        }

        let response_json: Value = res
            .json()
            .await
            .map_err(|e| InferenceError::Transport(format!("invalid response body: {e}")))?;

        extract_generated_text(&response_json).ok_or(InferenceError::EmptyResponse)
    }
}
