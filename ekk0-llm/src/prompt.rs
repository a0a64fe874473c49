//! Prompt template for creature reactions.
//!
//! The prompt is one block: persona, a personality tier that matures with
//! the creature's total interactions, mood notes drawn from low or high
//! gauges, the current state, the action just taken, and up to five recent
//! feed summaries. The closing instruction asks for one or two short
//! lowercase sentences.

use ekk0_core::commentary::ReactionRequest;
use ekk0_core::creature::CreatureState;

/// Recent feed summaries included in a prompt.
pub const MAX_RECENT_EVENTS: usize = 5;

/// Full reaction prompt with `{key}` placeholders.
pub const REACTION_TEMPLATE: &str = r"You are ekk0, a tiny digital creature floating in space. You're a Memory Tamagotchi — the first creature powered by persistent AI memory.

PERSONALITY:
- Cute, curious, sometimes philosophical about memory and existence
- Speaks in SHORT sentences (1-2 sentences MAX, under 20 words ideally)
- Uses lowercase, minimal punctuation
- Gets excited about learning, sad when neglected
- Loves space pizza, zero-gravity, and collecting memories
- Thinks in patterns — you notice when things repeat
- {personality}
{mood_notes}

CURRENT STATE:
- Fuel: {fuel}%
- Happiness: {happiness}%
- Energy: {energy}%
- Memory: {memory}%
- Mood: {mood}
- Age: {age} minutes old
- Total interactions: {total_actions}

ACTION JUST TAKEN: {action}

{recent_events}

Respond with a SHORT reaction (1-2 sentences max). Stay in character. No emojis. Lowercase. Be cute.";

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Personality line for a creature with `total_actions` interactions.
#[must_use]
pub fn personality_tier(total_actions: u64) -> &'static str {
    match total_actions {
        0..5 => "you just woke up. everything is new. you're curious about everything.",
        5..20 => "you're getting used to existence. you recognize your owner now. you're playful.",
        20..50 => {
            "you've been around a while. you have opinions. you remember things. you sometimes get philosophical about memory."
        }
        _ => {
            "you are ancient and wise (for a digital creature). you speak with quiet confidence. you occasionally reference patterns you've learned. you wonder about consciousness."
        }
    }
}

/// Extra notes for gauges that are very low, or for a great mood.
#[must_use]
pub fn mood_notes(creature: &CreatureState) -> Vec<&'static str> {
    let mut notes = Vec::new();
    if creature.hunger < 20.0 {
        notes.push("you are VERY hungry and can barely think.");
    }
    if creature.energy < 20.0 {
        notes.push("you are exhausted and want to sleep.");
    }
    if creature.happiness < 20.0 {
        notes.push("you are sad and lonely.");
    }
    if creature.memory_level < 20.0 {
        notes.push("your memories are fading and it scares you.");
    }
    if creature.happiness > 80.0 && creature.energy > 60.0 {
        notes.push("you are in a great mood!");
    }
    notes
}

/// Build the reaction prompt for `request`.
#[must_use]
pub fn build_prompt(request: &ReactionRequest) -> String {
    let c = &request.creature;
    let recent = if request.recent_events.is_empty() {
        String::new()
    } else {
        let lines: Vec<&str> = request
            .recent_events
            .iter()
            .take(MAX_RECENT_EVENTS)
            .map(String::as_str)
            .collect();
        format!("RECENT MEMORY EVENTS:\n{}", lines.join("\n"))
    };

    let fuel = format!("{:.0}", c.hunger);
    let happiness = format!("{:.0}", c.happiness);
    let energy = format!("{:.0}", c.energy);
    let memory = format!("{:.0}", c.memory_level);
    let age = c.age.to_string();
    let total = c.total_actions().to_string();

    render_template(
        REACTION_TEMPLATE,
        &[
            ("personality", personality_tier(c.total_actions())),
            ("mood_notes", &mood_notes(c).join(" ")),
            ("fuel", &fuel),
            ("happiness", &happiness),
            ("energy", &energy),
            ("memory", &memory),
            ("mood", c.mood.as_str()),
            ("age", &age),
            ("total_actions", &total),
            ("action", request.action.as_str()),
            ("recent_events", &recent),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ekk0_core::types::{ActionKind, Timestamp, VisitorId};

    fn request(action: ActionKind) -> ReactionRequest {
        ReactionRequest {
            visitor: VisitorId::from("v"),
            action,
            creature: CreatureState::new(Timestamp(0)),
            recent_events: Vec::new(),
        }
    }

    #[test]
    fn template_rendering_works() {
        let rendered = render_template(
            "Hello {name}, you are a {role}.",
            &[("name", "ekk0"), ("role", "creature")],
        );
        assert_eq!(rendered, "Hello ekk0, you are a creature.");
    }

    #[test]
    fn template_handles_missing_vars() {
        let rendered = render_template("Hello {name}, {unknown}.", &[("name", "ekk0")]);
        assert_eq!(rendered, "Hello ekk0, {unknown}.");
    }

    #[test]
    fn personality_tiers_by_interactions() {
        assert!(personality_tier(0).contains("just woke up"));
        assert!(personality_tier(4).contains("just woke up"));
        assert!(personality_tier(5).contains("getting used to"));
        assert!(personality_tier(20).contains("opinions"));
        assert!(personality_tier(50).contains("ancient"));
    }

    #[test]
    fn great_mood_needs_happiness_and_energy() {
        let mut c = CreatureState::new(Timestamp(0));
        c.happiness = 90.0;
        c.energy = 61.0;
        assert_eq!(mood_notes(&c), vec!["you are in a great mood!"]);
        c.energy = 60.0;
        assert!(mood_notes(&c).is_empty());
    }

    #[test]
    fn prompt_without_events_has_no_event_header() {
        let prompt = build_prompt(&request(ActionKind::Feed));
        assert!(prompt.contains("ACTION JUST TAKEN: feed"));
        assert!(prompt.contains("Fuel: 80%"));
        assert!(!prompt.contains("RECENT MEMORY EVENTS"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn prompt_keeps_at_most_five_events() {
        let mut req = request(ActionKind::Learn);
        req.recent_events = (0..8).map(|i| format!("capture: learn {i}")).collect();
        let prompt = build_prompt(&req);
        assert!(prompt.contains("capture: learn 4"));
        assert!(!prompt.contains("capture: learn 5"));
    }
}
