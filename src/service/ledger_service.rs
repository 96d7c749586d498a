//! Ledger service: runs the event pipeline and serves stats reads.

use std::sync::Arc;

use crate::domain::streak;
use crate::domain::{
    AchievementCatalog, AggregateStats, EventBus, GameDomain, GameEvent, KeyedLocks, StatsKey,
    StreakThresholds, UserId, UserProfile, ValidatedEvent, validate,
};
use crate::error::LedgerError;
use crate::persistence::{StatsRepository, UserDirectory};

/// Committed result of one game event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    /// Stats row as committed.
    pub stats: AggregateStats,
    /// Achievements unlocked by this event, in catalog order.
    pub newly_unlocked: Vec<String>,
}

/// One leaderboard position.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedStats {
    /// 1-based rank within the domain.
    pub rank: u64,
    /// Stats row at that rank.
    pub stats: AggregateStats,
}

/// A page of a domain leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    /// Domain ranked.
    pub domain: GameDomain,
    /// Rows of the requested page.
    pub entries: Vec<RankedStats>,
    /// Number of ranked rows in the domain.
    pub total: u64,
}

/// Orchestration layer for game events and stats reads.
///
/// Every event follows the same pipeline: validate → take the per-key
/// write lock → load (or create) the row → aggregate, streak and
/// achievements on a private copy → commit with one versioned write →
/// publish notifications.
#[derive(Debug)]
pub struct LedgerService {
    users: Arc<dyn UserDirectory>,
    stats: Arc<dyn StatsRepository>,
    locks: KeyedLocks<StatsKey>,
    catalog: Arc<AchievementCatalog>,
    thresholds: StreakThresholds,
    event_bus: EventBus,
}

impl LedgerService {
    /// Creates a new `LedgerService`.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserDirectory>,
        stats: Arc<dyn StatsRepository>,
        catalog: Arc<AchievementCatalog>,
        thresholds: StreakThresholds,
        event_bus: EventBus,
    ) -> Self {
        Self {
            users,
            stats,
            locks: KeyedLocks::new(),
            catalog,
            thresholds,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the achievement catalog.
    #[must_use]
    pub fn catalog(&self) -> &AchievementCatalog {
        &self.catalog
    }

    /// Returns the streak thresholds in effect.
    #[must_use]
    pub const fn thresholds(&self) -> &StreakThresholds {
        &self.thresholds
    }

    /// Registers a new player. A fresh id is allocated unless `user_id` is
    /// given.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for a blank name,
    /// [`LedgerError::UserAlreadyExists`] if the id is taken, or
    /// [`LedgerError::PersistenceError`] on storage failure.
    pub async fn register_user(
        &self,
        display_name: &str,
        user_id: Option<UserId>,
    ) -> Result<UserProfile, LedgerError> {
        if display_name.trim().is_empty() {
            return Err(LedgerError::InvalidRequest(
                "display_name must not be empty".to_string(),
            ));
        }
        let profile = UserProfile::with_id(user_id.unwrap_or_default(), display_name);
        self.users.register(&profile).await?;
        tracing::info!(user_id = %profile.user_id, "user registered");
        Ok(profile)
    }

    /// Looks up a player.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] if the user is unknown.
    pub async fn user(&self, user_id: UserId) -> Result<UserProfile, LedgerError> {
        self.users
            .get(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))
    }

    /// Validates an event and checks that its user exists. Mutates nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidEvent`] listing every field violation,
    /// or [`LedgerError::UserNotFound`] for an unknown user.
    pub async fn ingest(&self, event: GameEvent) -> Result<ValidatedEvent, LedgerError> {
        let validated = validate(event)?;
        if !self.users.exists(validated.user_id()).await? {
            return Err(LedgerError::UserNotFound(validated.user_id()));
        }
        Ok(validated)
    }

    /// Ingests an event and folds it into the `(user, domain)` stats row.
    ///
    /// # Errors
    ///
    /// Returns the [`ingest`](Self::ingest) errors, or
    /// [`LedgerError::ConcurrencyConflict`] if another instance committed
    /// the same row first. Nothing is committed on error.
    pub async fn record_event(&self, event: GameEvent) -> Result<EventOutcome, LedgerError> {
        let validated = self.ingest(event).await?;
        self.apply(&validated).await
    }

    /// Runs [`record_event`](Self::record_event) on its own task, so the
    /// commit and its notifications complete even if the caller stops
    /// waiting for the result.
    ///
    /// # Errors
    ///
    /// See [`record_event`](Self::record_event). A panicked task maps to
    /// [`LedgerError::Internal`].
    pub async fn record_event_detached(
        self: &Arc<Self>,
        event: GameEvent,
    ) -> Result<EventOutcome, LedgerError> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.record_event(event).await })
            .await
            .map_err(|e| LedgerError::Internal(format!("event task failed: {e}")))?
    }

    /// Runs the aggregation pipeline for an already validated event.
    ///
    /// # Errors
    ///
    /// See [`record_event`](Self::record_event).
    pub async fn apply(&self, event: &ValidatedEvent) -> Result<EventOutcome, LedgerError> {
        let key = StatsKey::new(event.user_id(), event.domain());
        let _guard = self.locks.lock(key).await;

        let current = self
            .stats
            .load(key)
            .await?
            .unwrap_or_else(|| AggregateStats::new(key));

        let success = self.thresholds.for_domain(key.domain).is_met(event);
        let mut next = current.clone();
        next.apply(event, success)?;
        next.streak = streak::update(
            current.streak,
            success,
            key.domain.tracks_failure_streak(),
        );
        let newly_unlocked = self.catalog.evaluate(&mut next);
        next.last_unlocked.clone_from(&newly_unlocked);

        next.version = match self.stats.save(&next).await {
            Ok(version) => version,
            Err(err) => {
                if err.is_retryable() {
                    tracing::warn!(
                        user_id = %key.user_id,
                        domain = %key.domain,
                        version = current.version,
                        "stale stats write rejected"
                    );
                }
                return Err(err);
            }
        };

        tracing::info!(
            user_id = %key.user_id,
            domain = %key.domain,
            games_played = next.games_played,
            current_streak = next.streak.current,
            unlocked = newly_unlocked.len(),
            "game event applied"
        );

        for achievement_id in &newly_unlocked {
            tracing::info!(
                user_id = %key.user_id,
                domain = %key.domain,
                achievement_id = %achievement_id,
                "achievement unlocked"
            );
        }
        self.event_bus
            .publish_stats_committed(&next, event.outcome_score(), &newly_unlocked);

        Ok(EventOutcome {
            stats: next,
            newly_unlocked,
        })
    }

    /// Current stats of one user in one domain.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] for an unknown user, or
    /// [`LedgerError::StatsNotFound`] if the user never played the domain.
    pub async fn stats(
        &self,
        user_id: UserId,
        domain: GameDomain,
    ) -> Result<AggregateStats, LedgerError> {
        self.ensure_user(user_id).await?;
        self.stats
            .load(StatsKey::new(user_id, domain))
            .await?
            .ok_or(LedgerError::StatsNotFound { user_id, domain })
    }

    /// Every stats row of a user, ordered by domain.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] for an unknown user.
    pub async fn user_stats(&self, user_id: UserId) -> Result<Vec<AggregateStats>, LedgerError> {
        self.ensure_user(user_id).await?;
        self.stats.load_user(user_id).await
    }

    /// Top players of a domain by score sum.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    pub async fn leaderboard(
        &self,
        domain: GameDomain,
        offset: usize,
        limit: usize,
    ) -> Result<Leaderboard, LedgerError> {
        let rows = self.stats.top(domain, offset, limit).await?;
        let total = self.stats.count(domain).await?;
        let first_rank = u64::try_from(offset).unwrap_or(u64::MAX).saturating_add(1);
        let entries = rows
            .into_iter()
            .zip(first_rank..)
            .map(|(stats, rank)| RankedStats { rank, stats })
            .collect();
        Ok(Leaderboard {
            domain,
            entries,
            total,
        })
    }

    async fn ensure_user(&self, user_id: UserId) -> Result<(), LedgerError> {
        if self.users.exists(user_id).await? {
            Ok(())
        } else {
            Err(LedgerError::UserNotFound(user_id))
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{EventPayload, LedgerEvent};
    use crate::persistence::MemoryStore;

    fn make_service() -> (LedgerService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = LedgerService::new(
            Arc::clone(&store) as Arc<dyn UserDirectory>,
            Arc::clone(&store) as Arc<dyn StatsRepository>,
            Arc::new(AchievementCatalog::standard()),
            StreakThresholds::default(),
            EventBus::new(64),
        );
        (service, store)
    }

    async fn register(service: &LedgerService) -> UserId {
        let Ok(profile) = service.register_user("ada", None).await else {
            panic!("registration failed");
        };
        profile.user_id
    }

    fn roast(user_id: UserId, score: i64) -> GameEvent {
        GameEvent {
            user_id,
            domain: GameDomain::CodeRoast,
            outcome_score: score,
            occurred_at: Utc::now(),
            duration_secs: Some(30),
            payload: EventPayload::CodeRoast {
                language: "rust".to_string(),
                lines_of_code: 120,
            },
        }
    }

    #[tokio::test]
    async fn code_roast_scenario_tracks_streaks_and_average() {
        let (service, _) = make_service();
        let user = register(&service).await;

        let mut streaks = Vec::new();
        let mut last = None;
        for score in [80, 60, 95] {
            let Ok(outcome) = service.record_event(roast(user, score)).await else {
                panic!("event rejected");
            };
            streaks.push((outcome.stats.streak.current, outcome.stats.streak.longest));
            last = Some(outcome.stats);
        }
        assert_eq!(streaks, vec![(1, 1), (0, 1), (1, 1)]);

        let Some(stats) = last else {
            panic!("no stats");
        };
        assert_eq!(stats.games_played, 3);
        assert_eq!(stats.score_sum, 235);
        assert_eq!(stats.recent_outcomes.to_vec(), vec![80, 60, 95]);
        let Some(avg) = stats.average_score() else {
            panic!("average missing");
        };
        assert!((avg - 78.333).abs() < 0.001);
        assert_eq!(stats.version, 3);
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let (service, _) = make_service();
        let result = service.record_event(roast(UserId::new(), 50)).await;
        assert!(matches!(result, Err(LedgerError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn invalid_event_mutates_nothing() {
        let (service, store) = make_service();
        let user = register(&service).await;

        let result = service.record_event(roast(user, 150)).await;
        let Err(LedgerError::InvalidEvent(err)) = result else {
            panic!("expected InvalidEvent");
        };
        assert!(err.has_field("outcome_score"));

        let Ok(row) = store.load(StatsKey::new(user, GameDomain::CodeRoast)).await else {
            panic!("load failed");
        };
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn detached_event_commits_after_caller_gives_up() {
        let (service, _) = make_service();
        let service = Arc::new(service);
        let user = register(&service).await;
        let mut rx = service.event_bus.subscribe();

        let held = service
            .locks
            .lock(StatsKey::new(user, GameDomain::CodeRoast))
            .await;
        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            service.record_event_detached(roast(user, 80)),
        )
        .await;
        assert!(abandoned.is_err());
        drop(held);

        let notified = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv()).await;
        assert!(matches!(notified, Ok(Ok(LedgerEvent::StatsUpdated { .. }))));
        let Ok(stats) = service.stats(user, GameDomain::CodeRoast).await else {
            panic!("stats missing");
        };
        assert_eq!(stats.games_played, 1);
    }

    #[tokio::test]
    async fn first_event_unlocks_first_game_once() {
        let (service, _) = make_service();
        let user = register(&service).await;
        let mut rx = service.event_bus().subscribe();

        let Ok(first) = service.record_event(roast(user, 40)).await else {
            panic!("event rejected");
        };
        assert_eq!(first.newly_unlocked, vec!["first_game".to_string()]);
        assert_eq!(first.stats.last_unlocked, first.newly_unlocked);

        let Ok(second) = service.record_event(roast(user, 40)).await else {
            panic!("event rejected");
        };
        assert!(second.newly_unlocked.is_empty());
        assert!(second.stats.unlocked_achievements.contains("first_game"));

        let Ok(LedgerEvent::StatsUpdated { games_played, .. }) = rx.try_recv() else {
            panic!("expected stats_updated");
        };
        assert_eq!(games_played, 1);
        let Ok(LedgerEvent::AchievementUnlocked { achievement_id, .. }) = rx.try_recv() else {
            panic!("expected achievement_unlocked");
        };
        assert_eq!(achievement_id, "first_game");
    }

    #[tokio::test]
    async fn concurrent_events_for_one_key_are_all_applied() {
        let (service, _) = make_service();
        let service = Arc::new(service);
        let user = register(&service).await;

        let mut handles = Vec::new();
        for i in 0..20 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.record_event(roast(user, i)).await
            }));
        }
        for handle in handles {
            let Ok(Ok(_)) = handle.await else {
                panic!("event failed");
            };
        }

        let Ok(stats) = service.stats(user, GameDomain::CodeRoast).await else {
            panic!("stats missing");
        };
        assert_eq!(stats.games_played, 20);
        assert_eq!(stats.score_sum, (0..20).sum::<u64>());
        assert_eq!(stats.recent_outcomes.len(), 10);
    }

    #[tokio::test]
    async fn stats_reads_distinguish_missing_user_and_row() {
        let (service, _) = make_service();
        let user = register(&service).await;

        let missing_row = service.stats(user, GameDomain::Casino).await;
        assert!(matches!(missing_row, Err(LedgerError::StatsNotFound { .. })));

        let missing_user = service.stats(UserId::new(), GameDomain::Casino).await;
        assert!(matches!(missing_user, Err(LedgerError::UserNotFound(_))));

        let Ok(rows) = service.user_stats(user).await else {
            panic!("user_stats failed");
        };
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn leaderboard_ranks_by_score_sum() {
        let (service, _) = make_service();
        let low = register(&service).await;
        let high = register(&service).await;
        let _ = service.record_event(roast(low, 10)).await;
        let _ = service.record_event(roast(high, 90)).await;

        let Ok(board) = service.leaderboard(GameDomain::CodeRoast, 0, 10).await else {
            panic!("leaderboard failed");
        };
        assert_eq!(board.total, 2);
        assert_eq!(board.entries[0].rank, 1);
        assert_eq!(board.entries[0].stats.user_id, high);
        assert_eq!(board.entries[1].stats.user_id, low);
    }

    #[tokio::test]
    async fn blank_display_name_is_rejected() {
        let (service, _) = make_service();
        let result = service.register_user("   ", None).await;
        assert!(matches!(result, Err(LedgerError::InvalidRequest(_))));
    }
}
