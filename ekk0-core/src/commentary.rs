//! Commentary Generator contract and its local fallback.
//!
//! The creature "talks" after each action. A primary generator (an LLM,
//! see the `ekk0-llm` crate) may produce the line; whenever it cannot, the
//! caller gets a canned line from [`fallback_lines`] instead. Commentary is
//! decoration only and never feeds back into the simulation.

use std::future::Future;

use parking_lot::Mutex;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::creature::CreatureState;
use crate::types::{ActionKind, VisitorId};

/// Where a reaction line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionSource {
    /// The primary (remote) generator.
    Primary,
    /// The local fallback table.
    Local,
}

/// A short line the creature says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// The line.
    pub text: String,
    /// Who produced it.
    pub source: ReactionSource,
}

impl Reaction {
    /// A line from the primary generator.
    #[must_use]
    pub fn primary(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: ReactionSource::Primary,
        }
    }

    /// A line from the local table.
    #[must_use]
    pub fn local(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: ReactionSource::Local,
        }
    }
}

/// Input to a commentary generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRequest {
    /// Who is playing; used for per-visitor rate limiting.
    pub visitor: VisitorId,
    /// The action just taken.
    pub action: ActionKind,
    /// State after the action.
    pub creature: CreatureState,
    /// Up to five `"{title}: {detail}"` summaries, newest first.
    pub recent_events: Vec<String>,
}

/// Something that can produce a reaction line.
///
/// Implementations must never fail: every error path degrades to a
/// [`ReactionSource::Local`] line.
pub trait Commentator: Send + Sync {
    /// Produce a reaction to `request`.
    fn generate_reaction(&self, request: &ReactionRequest) -> impl Future<Output = Reaction> + Send;
}

/// Canned lines per action kind.
pub const FEED_LINES: [&str; 3] = ["munch munch... space pizza!", "fuel cells charging", "tasty data bits"];
/// Canned play lines.
pub const PLAY_LINES: [&str; 3] = ["wheee zero gravity!", "boing boing boing", "catch me if you can"];
/// Canned sleep lines.
pub const SLEEP_LINES: [&str; 3] = ["zzz... dreaming of patterns", "recharging neural nets", "goodnight space"];
/// Canned learn lines.
pub const LEARN_LINES: [&str; 3] = ["new pattern acquired!", "ooh that's interesting", "knowledge feels warm"];
/// Lines used when there is no action context.
pub const IDLE_LINES: [&str; 3] = ["floating in the void...", "hello?", "the stars are pretty today"];

/// Fallback lines for `action` (idle lines for `None`).
#[must_use]
pub fn fallback_lines(action: Option<ActionKind>) -> &'static [&'static str] {
    match action {
        Some(ActionKind::Feed) => &FEED_LINES,
        Some(ActionKind::Play) => &PLAY_LINES,
        Some(ActionKind::Sleep) => &SLEEP_LINES,
        Some(ActionKind::Learn) => &LEARN_LINES,
        None => &IDLE_LINES,
    }
}

/// Pick a local line with the injected RNG.
pub fn pick_fallback<R: Rng + ?Sized>(action: Option<ActionKind>, rng: &mut R) -> Reaction {
    let text = fallback_lines(action)
        .choose(rng)
        .copied()
        .unwrap_or(IDLE_LINES[0]);
    Reaction::local(text)
}

/// Commentator that only ever uses the local table.
#[derive(Debug)]
pub struct LocalCommentator {
    rng: Mutex<StdRng>,
}

impl LocalCommentator {
    /// Deterministic commentator for tests and offline play.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Commentator seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Pick a line synchronously.
    pub fn pick(&self, action: Option<ActionKind>) -> Reaction {
        pick_fallback(action, &mut *self.rng.lock())
    }
}

impl Commentator for LocalCommentator {
    fn generate_reaction(&self, request: &ReactionRequest) -> impl Future<Output = Reaction> + Send {
        let reaction = self.pick(Some(request.action));
        std::future::ready(reaction)
    }
}
