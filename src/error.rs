//! Domain-specific error types for article-outline

use thiserror::Error;

/// Main error type for the article-outline library and server
#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Inference error: {message}")]
    Inference { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("HTTP server error: {message}")]
    Http { message: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<anyhow::Error> for OutlineError {
    fn from(err: anyhow::Error) -> Self {
        OutlineError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OutlineError {
    fn from(err: serde_json::Error) -> Self {
        OutlineError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for OutlineError {
    fn from(err: toml::de::Error) -> Self {
        OutlineError::Config {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for OutlineError {
    fn from(err: std::io::Error) -> Self {
        OutlineError::Io {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for OutlineError {
    fn from(err: reqwest::Error) -> Self {
        OutlineError::Inference {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

/// Why a generation request resolved to the template outline instead of model output.
///
/// The `Display` text is the notice shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    #[error("No Hugging Face token supplied. Using template generation.")]
    NoCredential,

    #[error("Rate limit reached after retrying. Using template generation.")]
    RateLimited,

    #[error(
        "Token issue: the token was rejected. Create a new token at https://huggingface.co/settings/tokens and try again."
    )]
    Unauthorized,

    #[error("No AI model available ({detail}). Using template generation.")]
    ModelUnavailable { detail: String },

    #[error("The model response was not a usable outline. Using template generation.")]
    MalformedResponse,

    #[error("Generation error: {detail}. Using template generation.")]
    GenericRemoteFailure { detail: String },
}

/// Display severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl FallbackReason {
    pub fn level(&self) -> NoticeLevel {
        match self {
            FallbackReason::Unauthorized => NoticeLevel::Error,
            FallbackReason::MalformedResponse => NoticeLevel::Info,
            FallbackReason::NoCredential
            | FallbackReason::RateLimited
            | FallbackReason::ModelUnavailable { .. }
            | FallbackReason::GenericRemoteFailure { .. } => NoticeLevel::Warning,
        }
    }

    /// True for the credential problems the user has to fix themselves.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            FallbackReason::NoCredential | FallbackReason::Unauthorized
        )
    }

    /// Stable machine-readable name used by the JSON API.
    pub fn code(&self) -> &'static str {
        match self {
            FallbackReason::NoCredential => "no_credential",
            FallbackReason::RateLimited => "rate_limited",
            FallbackReason::Unauthorized => "unauthorized",
            FallbackReason::ModelUnavailable { .. } => "model_unavailable",
            FallbackReason::MalformedResponse => "malformed_response",
            FallbackReason::GenericRemoteFailure { .. } => "generic_remote_failure",
        }
    }
}

/// Result type alias for article-outline operations
pub type Result<T> = std::result::Result<T, OutlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_errors_are_distinct() {
        assert!(FallbackReason::Unauthorized.is_credential_error());
        assert!(FallbackReason::NoCredential.is_credential_error());
        assert!(!FallbackReason::RateLimited.is_credential_error());
        assert_eq!(FallbackReason::Unauthorized.level(), NoticeLevel::Error);
        assert_eq!(FallbackReason::MalformedResponse.level(), NoticeLevel::Info);
    }

    #[test]
    fn unauthorized_notice_points_to_token_settings() {
        let msg = FallbackReason::Unauthorized.to_string();
        assert!(msg.contains("https://huggingface.co/settings/tokens"));
    }
}
