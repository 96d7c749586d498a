//! Notification fan-out for committed ledger and match writes.
//!
//! The services call the typed `publish_*` helpers after a commit; the
//! WebSocket layer subscribes and filters by user.

use chrono::Utc;
use tokio::sync::broadcast;

use super::{AggregateStats, LedgerEvent, Match, UserId};

/// Broadcast bus carrying [`LedgerEvent`]s.
///
/// Lagging receivers lose the oldest notifications once `capacity` is
/// exceeded. Publishing never blocks and never fails.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` notifications per receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Sends one notification. Returns how many receivers got it.
    pub fn publish(&self, event: LedgerEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Announces a committed stats row: `stats_updated` first, then one
    /// `achievement_unlocked` per id in `newly_unlocked`, all sharing one
    /// timestamp. Returns the number of notifications sent.
    pub fn publish_stats_committed(
        &self,
        stats: &AggregateStats,
        outcome_score: u64,
        newly_unlocked: &[String],
    ) -> usize {
        let timestamp = Utc::now();
        self.publish(LedgerEvent::StatsUpdated {
            user_id: stats.user_id,
            domain: stats.domain,
            games_played: stats.games_played,
            outcome_score,
            current_streak: stats.streak.current,
            timestamp,
        });
        for achievement_id in newly_unlocked {
            self.publish(LedgerEvent::AchievementUnlocked {
                user_id: stats.user_id,
                domain: stats.domain,
                achievement_id: achievement_id.clone(),
                timestamp,
            });
        }
        newly_unlocked.len().saturating_add(1)
    }

    /// Announces a newly created match.
    pub fn publish_match_created(&self, created: &Match) -> usize {
        self.publish(LedgerEvent::MatchCreated {
            match_id: created.match_id,
            user1_id: created.user1_id,
            user2_id: created.user2_id,
            timestamp: created.matched_at,
        })
    }

    /// Announces that `ended_by` ended `ended`.
    pub fn publish_match_ended(&self, ended: &Match, ended_by: UserId) -> usize {
        self.publish(LedgerEvent::MatchEnded {
            match_id: ended.match_id,
            user1_id: ended.user1_id,
            user2_id: ended.user2_id,
            ended_by,
            timestamp: Utc::now(),
        })
    }

    /// Opens a receiver for notifications published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// Number of open receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{GameDomain, StatsKey, UserPair};

    #[test]
    fn publishing_to_nobody_is_fine() {
        let bus = EventBus::new(8);
        let stats = AggregateStats::new(StatsKey::new(UserId::new(), GameDomain::Casino));
        assert_eq!(bus.publish_stats_committed(&stats, 0, &[]), 1);
        assert_eq!(bus.receiver_count(), 0);
    }

    #[tokio::test]
    async fn stats_update_precedes_its_unlocks() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let user = UserId::new();
        let mut stats = AggregateStats::new(StatsKey::new(user, GameDomain::BugChase));
        stats.games_played = 1;

        let unlocked = vec!["first_game".to_string(), "bug_chase.exterminator".to_string()];
        assert_eq!(bus.publish_stats_committed(&stats, 420, &unlocked), 3);

        let Ok(LedgerEvent::StatsUpdated {
            games_played,
            timestamp: updated_at,
            ..
        }) = rx.recv().await
        else {
            panic!("expected stats_updated first");
        };
        assert_eq!(games_played, 1);
        for expected in &unlocked {
            let Ok(LedgerEvent::AchievementUnlocked {
                achievement_id,
                timestamp,
                ..
            }) = rx.recv().await
            else {
                panic!("expected achievement_unlocked");
            };
            assert_eq!(&achievement_id, expected);
            assert_eq!(timestamp, updated_at);
        }
    }

    #[tokio::test]
    async fn match_notifications_name_both_users() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let (a, b) = (UserId::new(), UserId::new());
        let Some(pair) = UserPair::new(a, b) else {
            panic!("distinct users");
        };
        let m = Match::new(pair, Utc::now());

        assert_eq!(bus.publish_match_created(&m), 1);
        assert_eq!(bus.publish_match_ended(&m, b), 1);

        let Ok(created) = rx.recv().await else {
            panic!("missing match_created");
        };
        assert!(created.involves(a) && created.involves(b));
        let Ok(LedgerEvent::MatchEnded { ended_by, .. }) = rx.recv().await else {
            panic!("missing match_ended");
        };
        assert_eq!(ended_by, b);
    }
}
