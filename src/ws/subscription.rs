//! Per-connection subscription manager.
//!
//! Tracks which users a WebSocket client follows and provides server-side
//! event filtering.

use std::collections::HashSet;

use crate::domain::{LedgerEvent, UserId};

/// Manages the set of user subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Followed users. Ignored while `subscribe_all` is set.
    user_ids: HashSet<UserId>,
    /// Whether the client follows every user (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds users to the subscription set. `wildcard` follows everyone.
    pub fn subscribe(&mut self, ids: &[UserId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.user_ids.extend(ids.iter().copied());
    }

    /// Removes users from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[UserId]) {
        for id in ids {
            self.user_ids.remove(id);
        }
    }

    /// Returns `true` if the event involves a followed user.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        self.subscribe_all || self.user_ids.iter().any(|id| event.involves(*id))
    }

    /// Returns the number of explicitly followed users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.user_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GameDomain, MatchId};
    use chrono::Utc;

    fn stats_event(user_id: UserId) -> LedgerEvent {
        LedgerEvent::StatsUpdated {
            user_id,
            domain: GameDomain::Casino,
            games_played: 1,
            outcome_score: 10,
            current_streak: 1,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&stats_event(UserId::new())));
    }

    #[test]
    fn follows_specific_user() {
        let mut mgr = SubscriptionManager::new();
        let id = UserId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(&stats_event(id)));
        assert!(!mgr.matches(&stats_event(UserId::new())));
    }

    #[test]
    fn match_events_reach_either_party() {
        let mut mgr = SubscriptionManager::new();
        let (a, b) = (UserId::new(), UserId::new());
        mgr.subscribe(&[b], false);
        let event = LedgerEvent::MatchCreated {
            match_id: MatchId::new(),
            user1_id: a,
            user2_id: b,
            timestamp: Utc::now(),
        };
        assert!(mgr.matches(&event));
    }

    #[test]
    fn wildcard_and_unsubscribe() {
        let mut mgr = SubscriptionManager::new();
        let id = UserId::new();
        mgr.subscribe(&[id], false);
        mgr.unsubscribe(&[id]);
        assert_eq!(mgr.count(), 0);
        assert!(!mgr.matches(&stats_event(id)));

        mgr.subscribe(&[], true);
        assert!(mgr.is_subscribed_all());
        assert!(mgr.matches(&stats_event(UserId::new())));
    }
}
