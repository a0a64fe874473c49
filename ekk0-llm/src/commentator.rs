//! `LlmCommentator` — the primary commentary generator.
//!
//! Wraps an [`LlmClient`] with a per-visitor rate limit, a hard timeout and
//! response cleanup. Every failure degrades to a local line: idle lines
//! when no provider is configured, action lines when a configured provider
//! fails, times out, refuses, or returns nothing usable.

use std::future::Future;
use std::time::Duration;

use ekk0_core::commentary::{Commentator, LocalCommentator, Reaction, ReactionRequest};
use ekk0_core::config::LlmConfig;
use ekk0_core::types::ActionKind;
use tracing::{debug, warn};

use crate::client::LlmClient;
use crate::error::LlmError;
use crate::prompt;
use crate::rate_limit::RateLimiter;
use crate::types::LlmRequest;

/// Longest reaction kept, in characters.
pub const MAX_REACTION_CHARS: usize = 120;

/// Strip one pair of surrounding quotes, flatten newlines and truncate.
///
/// Returns `None` when nothing printable is left.
#[must_use]
pub fn clean_reaction(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix(['"', '\''])
        .unwrap_or(trimmed);
    let unquoted = unquoted
        .strip_suffix(['"', '\''])
        .unwrap_or(unquoted);
    let cleaned: String = unquoted
        .replace('\n', " ")
        .chars()
        .take(MAX_REACTION_CHARS)
        .collect();
    if cleaned.trim().is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Commentary generator backed by an LLM.
#[derive(Debug)]
pub struct LlmCommentator {
    client: LlmClient,
    limiter: RateLimiter,
    timeout: Duration,
    config: LlmConfig,
    fallback: LocalCommentator,
}

impl LlmCommentator {
    /// Build a commentator around `client`.
    #[must_use]
    pub fn new(client: LlmClient, config: LlmConfig, fallback: LocalCommentator) -> Self {
        Self {
            client,
            limiter: RateLimiter::new(Duration::from_millis(config.rate_limit_ms)),
            timeout: Duration::from_millis(config.request_timeout_ms),
            config,
            fallback,
        }
    }

    /// Build a commentator from configuration, reading the API key from the
    /// environment.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            LlmClient::from_config(config),
            config.clone(),
            LocalCommentator::from_entropy(),
        )
    }

    /// Whether a provider is configured at all.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.client.is_available()
    }

    /// Ask the model, or say why not.
    async fn ask(&self, request: &ReactionRequest) -> Result<String, LlmError> {
        if !self.client.is_available() {
            return Err(LlmError::Unavailable("No LLM provider configured".into()));
        }
        if let Err(left) = self.limiter.check(&request.visitor) {
            return Err(LlmError::RateLimited {
                retry_in_ms: u64::try_from(left.as_millis()).unwrap_or(u64::MAX),
            });
        }

        let llm_request = LlmRequest::from_config(prompt::build_prompt(request), &self.config);
        let response = tokio::time::timeout(self.timeout, self.client.generate(&llm_request))
            .await
            .map_err(|_| LlmError::Timeout(self.config.request_timeout_ms))??;
        clean_reaction(&response.text).ok_or(LlmError::EmptyResponse)
    }

    fn fallback_for(&self, action: ActionKind, err: &LlmError) -> Reaction {
        if err.is_provider_failure() {
            warn!(action = action.as_str(), error = %err, "Commentary fell back to local line");
            self.fallback.pick(Some(action))
        } else {
            debug!(error = %err, "Commentary unavailable; using idle line");
            self.fallback.pick(None)
        }
    }
}

impl Commentator for LlmCommentator {
    fn generate_reaction(&self, request: &ReactionRequest) -> impl Future<Output = Reaction> + Send {
        async move {
            match self.ask(request).await {
                Ok(text) => Reaction::primary(text),
                Err(err) => self.fallback_for(request.action, &err),
            }
        }
    }
}
