//! Memory events: the immutable entries of the feed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{EventId, Timestamp};

/// What produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// One per accepted action.
    Capture,
    /// Forged every few actions.
    Pattern,
    /// Issued every ten actions.
    Directive,
    /// Low-memory warning.
    Decay,
    /// Emitted when a stored snapshot is restored.
    Recall,
}

impl EventKind {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Pattern => "pattern",
            Self::Directive => "directive",
            Self::Decay => "decay",
            Self::Recall => "recall",
        }
    }

    /// The display layer this kind lands in.
    #[must_use]
    pub fn layer(self) -> Layer {
        match self {
            Self::Capture => Layer::Episodic,
            Self::Pattern => Layer::Patterns,
            Self::Directive => Layer::Directives,
            Self::Decay => Layer::Meta,
            Self::Recall => Layer::Recall,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display tag attached to an event. Carries no behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Raw interaction log.
    Episodic,
    /// Learned regularities.
    Patterns,
    /// Standing rules.
    Directives,
    /// Self-observation (decay warnings).
    Meta,
    /// Restored history.
    Recall,
}

impl Layer {
    /// Label shown next to the event.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Episodic => "L2 Episodic",
            Self::Patterns => "L4 Patterns",
            Self::Directives => "L9 Directives",
            Self::Meta => "L10 Meta",
            Self::Recall => "L3 Recall",
        }
    }
}

/// One entry of the memory feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    /// Unique identifier.
    pub id: EventId,
    /// What produced the event.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Single glyph shown in the feed.
    pub icon: String,
    /// Headline.
    pub title: String,
    /// Supporting detail.
    pub detail: String,
    /// When the event entered the feed.
    pub timestamp: Timestamp,
    /// Display tag.
    pub layer: Layer,
}

impl MemoryEvent {
    /// Build an event with a fresh id, in its kind's layer.
    #[must_use]
    pub fn new(
        kind: EventKind,
        icon: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: EventId::new(),
            kind,
            icon: icon.into(),
            title: title.into(),
            detail: detail.into(),
            timestamp,
            layer: kind.layer(),
        }
    }

    /// `"{title}: {detail}"`, the form handed to the commentary generator.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}: {}", self.title, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_kind_as_type() {
        let event = MemoryEvent::new(EventKind::Capture, "🍕", "capture: feed", "ok", Timestamp(5));
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "capture");
        assert_eq!(json["layer"], "episodic");
        assert_eq!(json["timestamp"], 5);
    }

    #[test]
    fn kinds_map_to_layers() {
        assert_eq!(EventKind::Pattern.layer(), Layer::Patterns);
        assert_eq!(EventKind::Directive.layer(), Layer::Directives);
        assert_eq!(EventKind::Decay.layer(), Layer::Meta);
        assert_eq!(EventKind::Recall.layer().label(), "L3 Recall");
    }

    #[test]
    fn fresh_ids() {
        let a = MemoryEvent::new(EventKind::Decay, "📉", "t", "d", Timestamp(0));
        let b = MemoryEvent::new(EventKind::Decay, "📉", "t", "d", Timestamp(0));
        assert_ne!(a.id, b.id);
        assert_eq!(a.summary(), "t: d");
    }
}
