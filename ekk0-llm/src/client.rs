//! LLM Client — unified interface for Gemini (Vertex AI), OpenAI-compatible
//! and Ollama backends.

use std::time::{Duration, Instant};

use ekk0_core::config::LlmConfig;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse};

/// Provider backend for LLM inference.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Gemini through the Vertex AI `generateContent` endpoint.
    Gemini {
        /// Endpoint root; empty selects the regional Vertex host.
        base_url: String,
        /// Cloud project.
        project: String,
        /// Cloud region.
        location: String,
        /// API key sent as the `key` query parameter.
        api_key: String,
    },
    /// OpenAI-compatible chat completions API.
    OpenAiCompatible {
        /// Endpoint root, e.g. `https://api.openai.com`.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// Ollama running locally.
    Ollama {
        /// Endpoint root, e.g. `http://localhost:11434`.
        base_url: String,
    },
    /// No LLM available — all calls return error, triggering the local fallback.
    None,
}

/// One HTTP call, described independently of the retry loop.
struct Call<'a> {
    provider: &'static str,
    url: String,
    bearer: Option<&'a str>,
    body: Value,
    text: fn(&Value) -> Option<&str>,
    tokens: fn(&Value) -> Option<u64>,
}

/// The main LLM client that routes requests to the configured backend.
#[derive(Debug, Clone)]
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new LLM client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_retries,
        }
    }

    /// Create a client with no LLM backend (all calls fail → local fallback).
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), 0)
    }

    /// Build a client from configuration, reading the API key from the
    /// environment variable named in `config.api_key_env`.
    ///
    /// A keyed provider whose key is absent degrades to [`LlmProvider::None`].
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        let key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::from_config_with_key(config, key)
    }

    /// Build a client from configuration with an explicit API key.
    #[must_use]
    pub fn from_config_with_key(config: &LlmConfig, api_key: Option<String>) -> Self {
        let provider = match (config.provider.to_ascii_lowercase().as_str(), api_key) {
            ("gemini" | "vertex", Some(api_key)) => LlmProvider::Gemini {
                base_url: config.base_url.clone(),
                project: config.project.clone(),
                location: config.location.clone(),
                api_key,
            },
            ("openai", Some(api_key)) => LlmProvider::OpenAiCompatible {
                base_url: non_empty_or(&config.base_url, "https://api.openai.com"),
                api_key,
            },
            ("ollama", _) => LlmProvider::Ollama {
                base_url: non_empty_or(&config.base_url, "http://localhost:11434"),
            },
            ("none", _) => LlmProvider::None,
            (other, None) if other == "gemini" || other == "vertex" || other == "openai" => {
                debug!(
                    provider = other,
                    env = %config.api_key_env,
                    "API key not set; commentary will use local lines"
                );
                LlmProvider::None
            }
            (other, _) => {
                warn!(provider = other, "Unknown LLM provider; commentary will use local lines");
                LlmProvider::None
            }
        };
        Self::new(provider, config.model.clone(), config.max_retries)
    }

    /// The configured backend.
    #[must_use]
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Generate a response from the LLM.
    ///
    /// Returns `Err` if the LLM is unavailable or all retries fail.
    /// The caller should fall back to a local line on error.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let call = match &self.provider {
            LlmProvider::None => {
                return Err(LlmError::Unavailable("No LLM provider configured".into()));
            }
            LlmProvider::Gemini {
                base_url,
                project,
                location,
                api_key,
            } => Call {
                provider: "gemini",
                url: gemini_url(base_url, project, location, &self.model, api_key),
                bearer: None,
                body: gemini_body(request),
                text: gemini_text,
                tokens: |v| v["usageMetadata"]["candidatesTokenCount"].as_u64(),
            },
            LlmProvider::OpenAiCompatible { base_url, api_key } => Call {
                provider: "openai",
                url: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
                bearer: Some(api_key),
                body: openai_body(&self.model, request),
                text: openai_text,
                tokens: |v| v["usage"]["completion_tokens"].as_u64(),
            },
            LlmProvider::Ollama { base_url } => Call {
                provider: "ollama",
                url: format!("{}/api/generate", base_url.trim_end_matches('/')),
                bearer: None,
                body: ollama_body(&self.model, request),
                text: ollama_text,
                tokens: |v| v["eval_count"].as_u64(),
            },
        };
        self.execute(call, request.timeout_ms).await
    }

    /// Send `call`, retrying up to `max_retries` times on failure.
    async fn execute(&self, call: Call<'_>, timeout_ms: u64) -> Result<LlmResponse, LlmError> {
        let mut last_error = LlmError::RequestFailed("no attempt made".into());
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(
                    provider = call.provider,
                    "Retrying LLM call (attempt {}/{})",
                    attempt + 1,
                    self.max_retries + 1
                );
            }

            let start = Instant::now();
            let mut builder = self
                .http
                .post(&call.url)
                .json(&call.body)
                .timeout(Duration::from_millis(timeout_ms));
            if let Some(token) = call.bearer {
                builder = builder.bearer_auth(token);
            }

            match builder.send().await {
                Ok(resp) if resp.status().is_success() => {
                    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let json: Value = resp
                        .json()
                        .await
                        .map_err(|e| LlmError::ParseError(e.to_string()))?;
                    let text = (call.text)(&json)
                        .filter(|t| !t.trim().is_empty())
                        .ok_or(LlmError::EmptyResponse)?;
                    let tokens = (call.tokens)(&json).unwrap_or(0);
                    debug!(provider = call.provider, latency_ms, tokens, "LLM call succeeded");
                    return Ok(LlmResponse {
                        text: text.to_string(),
                        tokens_generated: u32::try_from(tokens).unwrap_or(u32::MAX),
                        latency_ms,
                        model: self.model.clone(),
                    });
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    warn!(provider = call.provider, status, "LLM provider returned error");
                    last_error = LlmError::Http { status };
                }
                Err(e) if e.is_timeout() => {
                    warn!(provider = call.provider, timeout_ms, "LLM request timed out");
                    last_error = LlmError::Timeout(timeout_ms);
                }
                Err(e) => {
                    warn!(provider = call.provider, error = %e, "LLM request failed");
                    last_error = e.into();
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last: Box::new(last_error),
        })
    }

    /// Check if the LLM client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Vertex AI `generateContent` URL for `model`.
#[must_use]
pub fn gemini_url(base_url: &str, project: &str, location: &str, model: &str, api_key: &str) -> String {
    let root = if base_url.trim().is_empty() {
        format!("https://{location}-aiplatform.googleapis.com")
    } else {
        base_url.trim_end_matches('/').to_string()
    };
    format!(
        "{root}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent?key={api_key}"
    )
}

fn gemini_body(request: &LlmRequest) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        "generationConfig": {
            "maxOutputTokens": request.max_tokens,
            "temperature": request.temperature,
            "topP": request.top_p,
        }
    })
}

fn openai_body(model: &str, request: &LlmRequest) -> Value {
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": request.prompt }],
        "max_tokens": request.max_tokens,
        "temperature": request.temperature,
        "top_p": request.top_p,
    })
}

fn ollama_body(model: &str, request: &LlmRequest) -> Value {
    json!({
        "model": model,
        "prompt": request.prompt,
        "stream": false,
        "options": {
            "temperature": request.temperature,
            "top_p": request.top_p,
            "num_predict": request.max_tokens,
        }
    })
}

fn gemini_text(v: &Value) -> Option<&str> {
    v["candidates"][0]["content"]["parts"][0]["text"].as_str()
}

fn openai_text(v: &Value) -> Option<&str> {
    v["choices"][0]["message"]["content"].as_str()
}

fn ollama_text(v: &Value) -> Option<&str> {
    v["response"].as_str()
}
