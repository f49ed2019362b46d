//! Refresh event types
//!
//! The session bridge broadcasts one [`RefreshEvent`] per refresh it
//! handles, so hosts can observe when live sessions picked up new
//! permissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a refresh did.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Permissions were applied to a live session
    Applied,
    /// The subject had no live session; nothing was applied
    NoSession,
}

/// A refresh handled by the session bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Subject whose permissions were refreshed
    pub subject_id: Uuid,

    /// What happened
    pub outcome: RefreshOutcome,

    /// Number of nodes in the applied map (0 when nothing was applied)
    pub entries: usize,

    /// When the refresh ran
    pub timestamp: DateTime<Utc>,
}

impl RefreshEvent {
    /// Create a new event.
    pub fn new(subject_id: Uuid, outcome: RefreshOutcome, entries: usize) -> Self {
        Self {
            id: Uuid::now_v7(),
            subject_id,
            outcome,
            entries,
            timestamp: Utc::now(),
        }
    }

    /// Create an event for a subject without a live session.
    pub fn no_session(subject_id: Uuid) -> Self {
        Self::new(subject_id, RefreshOutcome::NoSession, 0)
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == RefreshOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let subject_id = Uuid::now_v7();
        let event = RefreshEvent::new(subject_id, RefreshOutcome::Applied, 3);
        assert_eq!(event.subject_id, subject_id);
        assert!(event.is_applied());
        assert_eq!(event.entries, 3);

        let event = RefreshEvent::no_session(subject_id);
        assert!(!event.is_applied());
        assert_eq!(event.entries, 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = RefreshEvent::no_session(Uuid::now_v7());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outcome"], "no_session");

        let back: RefreshEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
