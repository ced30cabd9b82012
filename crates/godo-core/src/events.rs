use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::dispatch::DecisionCounts;

/// Every state change in a swipe session produces an Event.
/// The host drains them after each call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ItemsLoaded {
        count: usize,
        /// "remote", "local", "fallback" or "unavailable".
        origin: String,
        at: DateTime<Utc>,
    },
    SwipeCommitted {
        item_id: String,
        direction: Direction,
        counts: DecisionCounts,
        at: DateTime<Utc>,
    },
    /// Card released without meeting a commit threshold.
    SwipeCancelled {
        item_id: String,
        at: DateTime<Utc>,
    },
    QueueAdvanced {
        cursor: usize,
        item_id: Option<String>,
        at: DateTime<Utc>,
    },
    DecisionUndone {
        item_id: String,
        direction: Direction,
        counts: DecisionCounts,
        at: DateTime<Utc>,
    },
    /// Remote mode served the local dataset. Informational; not for display.
    SourceFallback {
        reason: String,
        at: DateTime<Utc>,
    },
    /// Neither source produced items.
    NoDataAvailable {
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::ItemsLoaded { at, .. }
            | Event::SwipeCommitted { at, .. }
            | Event::SwipeCancelled { at, .. }
            | Event::QueueAdvanced { at, .. }
            | Event::DecisionUndone { at, .. }
            | Event::SourceFallback { at, .. }
            | Event::NoDataAvailable { at } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::SwipeCommitted {
            item_id: "evt-1".into(),
            direction: Direction::CommitPublic,
            counts: DecisionCounts::default(),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SwipeCommitted");
        assert_eq!(json["direction"], "commit-public");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
