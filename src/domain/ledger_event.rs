//! Notifications emitted after committed ledger and match mutations.
//!
//! Every commit publishes a [`LedgerEvent`] through the [`super::EventBus`].
//! WebSocket connections forward the ones involving users they subscribed
//! to.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{GameDomain, MatchId, UserId};

/// Domain event emitted after every committed mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A game event was applied to a stats row.
    StatsUpdated {
        /// Owner of the row.
        user_id: UserId,
        /// Domain of the row.
        domain: GameDomain,
        /// Play count after the event.
        games_played: u64,
        /// Outcome score of the event.
        outcome_score: u64,
        /// Success streak after the event.
        current_streak: u32,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An achievement was unlocked for the first time.
    AchievementUnlocked {
        /// Player who unlocked it.
        user_id: UserId,
        /// Domain whose stats satisfied the predicate.
        domain: GameDomain,
        /// Catalog identifier.
        achievement_id: String,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Two users liked each other.
    MatchCreated {
        /// Match identifier.
        match_id: MatchId,
        /// Smaller user id of the pair.
        user1_id: UserId,
        /// Larger user id of the pair.
        user2_id: UserId,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// One of the users unmatched.
    MatchEnded {
        /// Match identifier.
        match_id: MatchId,
        /// Smaller user id of the pair.
        user1_id: UserId,
        /// Larger user id of the pair.
        user2_id: UserId,
        /// User who unmatched.
        ended_by: UserId,
        /// Timestamp of the unmatch.
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Returns `true` if `user_id` is a party to this event.
    #[must_use]
    pub fn involves(&self, user_id: UserId) -> bool {
        match self {
            Self::StatsUpdated { user_id: u, .. } | Self::AchievementUnlocked { user_id: u, .. } => {
                *u == user_id
            }
            Self::MatchCreated {
                user1_id, user2_id, ..
            }
            | Self::MatchEnded {
                user1_id, user2_id, ..
            } => *user1_id == user_id || *user2_id == user_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::StatsUpdated { .. } => "stats_updated",
            Self::AchievementUnlocked { .. } => "achievement_unlocked",
            Self::MatchCreated { .. } => "match_created",
            Self::MatchEnded { .. } => "match_ended",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn match_event_involves_both_users() {
        let a = UserId::new();
        let b = UserId::new();
        let event = LedgerEvent::MatchCreated {
            match_id: MatchId::new(),
            user1_id: a,
            user2_id: b,
            timestamp: Utc::now(),
        };
        assert!(event.involves(a));
        assert!(event.involves(b));
        assert!(!event.involves(UserId::new()));
    }

    #[test]
    fn achievement_event_serializes_with_tag() {
        let event = LedgerEvent::AchievementUnlocked {
            user_id: UserId::new(),
            domain: GameDomain::CodeRoast,
            achievement_id: "first_game".to_string(),
            timestamp: Utc::now(),
        };
        let Ok(json) = serde_json::to_string(&event) else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"event_type\":\"achievement_unlocked\""));
        assert!(json.contains("\"domain\":\"code_roast\""));
        assert_eq!(event.event_type_str(), "achievement_unlocked");
    }
}
