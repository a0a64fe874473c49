//! # ekk0-llm — Commentary Backends for ekk0
//!
//! Gives the creature a voice. After each action the host asks a
//! [`Commentator`](ekk0_core::commentary::Commentator) for a one-line
//! reaction; this crate provides the LLM-backed one:
//!   - **Gemini** through Vertex AI (default)
//!   - **OpenAI-compatible API**
//!   - **Ollama** (local)
//!
//! Every call is rate limited per visitor, bounded by a hard timeout, and
//! cleaned before use. Any failure degrades to the core's local line table,
//! so the simulation never waits on or depends on a model.

pub mod client;
pub mod commentator;
pub mod error;
pub mod prompt;
pub mod rate_limit;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use commentator::LlmCommentator;
pub use error::LlmError;
pub use rate_limit::RateLimiter;
pub use types::{LlmRequest, LlmResponse};
