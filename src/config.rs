use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Default ordered model list; the first one that answers a probe is used
pub const DEFAULT_MODELS: &[&str] = &[
    "meta-llama/Llama-3.2-3B-Instruct",
    "google/flan-t5-large",
    "google/flan-t5-base",
];

pub const DEFAULT_API_BASE: &str = "https://api-inference.huggingface.co";

const BACKOFF_MIN_MS: u64 = 3_000;
const BACKOFF_MAX_MS: u64 = 5_000;

/// Main configuration structure loaded from article_outline.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Which inference route the client calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    /// `POST {base}/models/{model}` with `inputs` and `parameters`
    TextGeneration,
    /// `POST {base}/models/{model}/v1/chat/completions`
    Chat,
}

impl std::str::FromStr for ApiStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text_generation" | "text-generation" => Ok(ApiStyle::TextGeneration),
            "chat" => Ok(ApiStyle::Chat),
            other => Err(format!("unknown api style: {other}")),
        }
    }
}

/// Remote generation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub models: Vec<String>,
    pub api_base: String,
    pub api_style: ApiStyle,
    pub probe_models: bool,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub request_timeout_ms: u64,
    pub rate_limit_backoff_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_style: ApiStyle::TextGeneration,
            probe_models: true,
            max_new_tokens: 1500,
            temperature: 0.7,
            request_timeout_ms: 60_000,
            rate_limit_backoff_ms: 4_000,
        }
    }
}

impl GenerationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }

    /// Clamp tunables into their supported ranges and reject unusable settings
    pub fn validate(&mut self) -> anyhow::Result<()> {
        self.models.retain(|m| !m.trim().is_empty());
        if self.models.is_empty() {
            anyhow::bail!("at least one model must be configured");
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            anyhow::bail!(
                "api_base '{}' must start with http:// or https://",
                self.api_base
            );
        }

        let backoff = self
            .rate_limit_backoff_ms
            .clamp(BACKOFF_MIN_MS, BACKOFF_MAX_MS);
        if backoff != self.rate_limit_backoff_ms {
            tracing::warn!(
                "rate_limit_backoff_ms {} outside {}..={}, clamping to {}",
                self.rate_limit_backoff_ms,
                BACKOFF_MIN_MS,
                BACKOFF_MAX_MS,
                backoff
            );
            self.rate_limit_backoff_ms = backoff;
        }

        self.temperature = self.temperature.clamp(0.0, 2.0);
        self.max_new_tokens = self.max_new_tokens.clamp(16, 4096);
        if self.request_timeout_ms == 0 {
            self.request_timeout_ms = 60_000;
        }
        Ok(())
    }
}

/// HTTP form front end settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_bind: SocketAddr,
    /// Client sessions kept before the least recently used is dropped
    pub session_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            session_capacity: 1024,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub hf_token: Option<String>,
    pub log_level: String,
    pub log_ansi: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            hf_token: None,
            log_level: "article_outline=info,tower_http=info".to_string(),
            log_ansi: true,
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        let mut cfg = Self::default();
        cfg.hf_token = std::env::var("HF_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if let Ok(level) = std::env::var("OUTLINE_LOG") {
            cfg.log_level = level;
        }
        if let Ok(ansi) = std::env::var("OUTLINE_LOG_ANSI") {
            cfg.log_ansi = !(ansi == "0" || ansi.eq_ignore_ascii_case("false"));
        }
        cfg
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            server: ServerConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses ARTICLE_OUTLINE_CONFIG environment variable or defaults to "article_outline.toml"
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(env_path) = std::env::var("OUTLINE_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }

        let config_path = std::env::var("ARTICLE_OUTLINE_CONFIG")
            .unwrap_or_else(|_| "article_outline.toml".to_string());

        let mut config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml_str(&content)?
        } else {
            tracing::debug!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.generation.validate()?;

        Ok(config)
    }

    /// Parse a TOML document; absent tables fall back to defaults
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        let generation = &mut self.generation;

        if let Ok(models) = std::env::var("OUTLINE_MODELS") {
            generation.models = models
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            tracing::debug!("OUTLINE_MODELS env override applied");
        }
        if let Ok(base) = std::env::var("OUTLINE_API_BASE") {
            generation.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(style) = std::env::var("OUTLINE_API_STYLE")
            .ok()
            .and_then(|v| v.parse::<ApiStyle>().ok())
        {
            generation.api_style = style;
        }
        if let Some(timeout) = std::env::var("OUTLINE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            generation.request_timeout_ms = timeout;
        }
        if let Some(backoff) = std::env::var("OUTLINE_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            generation.rate_limit_backoff_ms = backoff;
        }
        if let Some(tokens) = std::env::var("OUTLINE_MAX_NEW_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            generation.max_new_tokens = tokens;
        }
        if let Some(temp) = std::env::var("OUTLINE_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
        {
            generation.temperature = temp;
        }
        if let Ok(probe) = std::env::var("OUTLINE_PROBE_MODELS") {
            generation.probe_models = !(probe == "0" || probe.eq_ignore_ascii_case("false"));
        }
        if let Ok(v) = std::env::var("OUTLINE_HTTP_BIND")
            && let Ok(bind) = v.parse::<SocketAddr>()
        {
            self.server.http_bind = bind;
        }
        if let Some(max) = std::env::var("OUTLINE_SESSION_MAX")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&v| v > 0)
        {
            self.server.session_capacity = max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.generation.models.len(), 3);
        assert_eq!(config.generation.models[0], "meta-llama/Llama-3.2-3B-Instruct");
        assert_eq!(config.generation.max_new_tokens, 1500);
        assert_eq!(config.generation.api_style, ApiStyle::TextGeneration);
        assert_eq!(config.server.http_bind.port(), 8501);
        assert_eq!(config.server.session_capacity, 1024);
        assert!(config.runtime.hf_token.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [generation]
            models = ["google/flan-t5-base"]
            api_style = "chat"
            "#,
        )
        .unwrap();
        assert_eq!(config.generation.models, vec!["google/flan-t5-base"]);
        assert_eq!(config.generation.api_style, ApiStyle::Chat);
        assert_eq!(config.generation.temperature, 0.7);
        assert_eq!(config.server.http_bind.port(), 8501);
        assert_eq!(config.server.session_capacity, 1024);
    }

    #[test]
    fn test_validate_clamps_backoff() {
        let mut generation = GenerationConfig {
            rate_limit_backoff_ms: 60_000,
            ..Default::default()
        };
        generation.validate().unwrap();
        assert_eq!(generation.rate_limit_backoff_ms, 5_000);

        generation.rate_limit_backoff_ms = 10;
        generation.validate().unwrap();
        assert_eq!(generation.rate_limit_backoff_ms, 3_000);
    }

    #[test]
    fn test_validate_rejects_empty_models() {
        let mut generation = GenerationConfig {
            models: vec!["  ".into()],
            ..Default::default()
        };
        assert!(generation.validate().is_err());
    }

    #[test]
    fn test_api_style_parse() {
        assert_eq!("chat".parse::<ApiStyle>(), Ok(ApiStyle::Chat));
        assert_eq!(
            "text-generation".parse::<ApiStyle>(),
            Ok(ApiStyle::TextGeneration)
        );
        assert!("grpc".parse::<ApiStyle>().is_err());
    }
}
