//! LLM error types.

use thiserror::Error;

/// Errors that can occur while asking a model for a reaction line.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// The provider answered with a non-success status.
    #[error("LLM provider returned HTTP {status}")]
    Http {
        /// Status code.
        status: u16,
    },

    /// LLM response was not valid JSON.
    #[error("Failed to parse LLM response as JSON: {0}")]
    ParseError(String),

    /// The response parsed but carried no text.
    #[error("LLM response contained no text")]
    EmptyResponse,

    /// Request timed out.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// No provider is configured (or its API key is missing).
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),

    /// The visitor asked again too soon.
    #[error("Rate limited: retry in {retry_in_ms}ms")]
    RateLimited {
        /// Time left until the next call is allowed.
        retry_in_ms: u64,
    },

    /// All retry attempts exhausted.
    #[error("All LLM retry attempts exhausted after {attempts} tries: {last}")]
    RetriesExhausted {
        /// How many requests were sent.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last: Box<LlmError>,
    },

    /// Configuration error.
    #[error("LLM configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Whether the failure happened while talking to a configured provider.
    ///
    /// Such failures get an action-specific fallback line; anything else
    /// (nothing configured, an internal error) gets an idle line.
    #[must_use]
    pub fn is_provider_failure(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::Http { .. }
            | Self::EmptyResponse
            | Self::Timeout(_)
            | Self::RateLimited { .. } => true,
            Self::RetriesExhausted { last, .. } => last.is_provider_failure(),
            Self::ParseError(_) | Self::Unavailable(_) | Self::ConfigError(_) => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if let Some(status) = err.status() {
            LlmError::Http {
                status: status.as_u16(),
            }
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}
