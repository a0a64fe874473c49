//! Canned feed content: icons, pattern catalogue, directives.

use crate::types::ActionKind;

/// A canned title/detail pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedLine {
    /// Short headline.
    pub title: &'static str,
    /// Supporting detail.
    pub detail: &'static str,
}

const fn line(title: &'static str, detail: &'static str) -> CannedLine {
    CannedLine { title, detail }
}

/// Icon of the capture event for an action.
#[must_use]
pub fn capture_icon(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Feed => "🍕",
        ActionKind::Play => "🎮",
        ActionKind::Sleep => "💤",
        ActionKind::Learn => "🧠",
    }
}

/// Icon of pattern events.
pub const PATTERN_ICON: &str = "⚡";
/// Icon of directive events.
pub const DIRECTIVE_ICON: &str = "📜";
/// Icon of decay warnings.
pub const DECAY_ICON: &str = "📉";
/// Icon of recall events.
pub const RECALL_ICON: &str = "🔁";

const FEED_PATTERNS: [CannedLine; 3] = [
    line("Nutrition cycle recognised", "Feeding restores 25 fuel + 5 energy"),
    line("Caloric preference logged", "Space pizza is the preferred fuel source"),
    line("Metabolic pattern", "Fuel depletes at 1.2x base rate"),
];

const PLAY_PATTERNS: [CannedLine; 3] = [
    line("Joy response calibrated", "Play increases happiness by 20 points"),
    line("Energy trade-off learned", "Play costs 10 energy but boosts mood significantly"),
    line("Social bonding pattern", "Interaction frequency correlates with happiness baseline"),
];

const SLEEP_PATTERNS: [CannedLine; 3] = [
    line("Recharge cycle optimised", "Sleep restores 35 energy + 5 happiness"),
    line("Rest requirement pattern", "Energy below 15% triggers fatigue state"),
    line("Circadian rhythm detected", "Sleep efficiency improves with consistent timing"),
];

const LEARN_PATTERNS: [CannedLine; 3] = [
    line("Knowledge acquisition", "Learning adds 15 to memory capacity"),
    line("Cognitive cost measured", "Learning costs 8 energy and 3 fuel"),
    line("Memory reinforcement", "Repeated learning prevents memory decay"),
];

/// The three pattern descriptions that can be forged after `kind`.
#[must_use]
pub fn patterns_for(kind: ActionKind) -> &'static [CannedLine] {
    match kind {
        ActionKind::Feed => &FEED_PATTERNS,
        ActionKind::Play => &PLAY_PATTERNS,
        ActionKind::Sleep => &SLEEP_PATTERNS,
        ActionKind::Learn => &LEARN_PATTERNS,
    }
}

/// Global directive catalogue.
pub const DIRECTIVES: [CannedLine; 3] = [
    line(
        "[PREFER] Owner tends to feed before play",
        "Behavioural sequence detected across 10+ interactions",
    ),
    line(
        "[MUST] Maintain energy above 15%",
        "Critical threshold — below this, cognitive function degrades",
    ),
    line(
        "[AVOID] Learning on empty fuel",
        "Knowledge retention drops 40% when fuel < 20%",
    ),
];
