//! Core types for LLM requests and responses.

use ekk0_core::config::LlmConfig;
use serde::{Deserialize, Serialize};

/// A single-prompt completion request.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// Full prompt text (persona, state and instructions in one block).
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// A short-reaction request with the default sampling settings.
    #[must_use]
    pub fn reaction(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 60,
            temperature: 0.95,
            top_p: 0.9,
            timeout_ms: 5000,
        }
    }

    /// A reaction request tuned by `config`.
    #[must_use]
    pub fn from_config(prompt: impl Into<String>, config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_output_tokens,
            temperature: config.temperature,
            timeout_ms: config.request_timeout_ms,
            ..Self::reaction(prompt)
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// A response from the LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    /// The generated text, untrimmed.
    pub text: String,
    /// How many tokens were generated, when the provider reports it.
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}
