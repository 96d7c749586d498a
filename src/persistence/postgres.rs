//! PostgreSQL implementation of the repositories.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{MatchRow, StatsRow, SwipeRow, UserRow};
use super::{StatsRepository, SwipeRepository, UserDirectory};
use crate::config::LedgerConfig;
use crate::domain::{
    AggregateStats, GameDomain, Match, MatchInsert, StatsKey, SwipeAction, UserId, UserPair,
    UserProfile,
};
use crate::error::LedgerError;

const STATS_FIELDS: &str = "user_id, domain, games_played, score_sum, best_score, worst_score, \
     total_play_secs, counters, current_streak, longest_streak, current_failure_streak, \
     longest_failure_streak, recent_outcomes, unlocked_achievements, last_unlocked, version, \
     created_at, updated_at";
const MATCH_FIELDS: &str = "match_id, user1_id, user2_id, matched_at, is_active";

/// Domain names in declaration order, used to sort a user's rows the same
/// way the in-memory store does.
fn domain_order() -> Vec<&'static str> {
    GameDomain::ALL.into_iter().map(GameDomain::as_str).collect()
}

/// PostgreSQL-backed repositories using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store on an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool using the database settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] if the database is
    /// unreachable.
    pub async fn connect(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), LedgerError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::PersistenceError(e.to_string()))
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserDirectory for PostgresStore {
    async fn register(&self, user: &UserProfile) -> Result<(), LedgerError> {
        let result = sqlx::query(
            "INSERT INTO users (user_id, display_name, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.display_name)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::UserAlreadyExists(user.user_id));
        }
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<UserProfile>, LedgerError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, display_name, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserProfile::from))
    }

    async fn exists(&self, user_id: UserId) -> Result<bool, LedgerError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)",
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl StatsRepository for PostgresStore {
    async fn load(&self, key: StatsKey) -> Result<Option<AggregateStats>, LedgerError> {
        let query =
            format!("SELECT {STATS_FIELDS} FROM aggregate_stats WHERE user_id = $1 AND domain = $2");
        let row = sqlx::query_as::<_, StatsRow>(&query)
            .bind(key.user_id.as_uuid())
            .bind(key.domain.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(AggregateStats::try_from).transpose()
    }

    async fn load_user(&self, user_id: UserId) -> Result<Vec<AggregateStats>, LedgerError> {
        let query = format!(
            "SELECT {STATS_FIELDS} FROM aggregate_stats WHERE user_id = $1 \
             ORDER BY array_position($2::text[], domain)"
        );
        let rows = sqlx::query_as::<_, StatsRow>(&query)
            .bind(user_id.as_uuid())
            .bind(domain_order())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(AggregateStats::try_from).collect()
    }

    async fn save(&self, stats: &AggregateStats) -> Result<i64, LedgerError> {
        let row = StatsRow::try_from(stats)?;
        let next_version = stats.version.saturating_add(1);

        let result = if stats.version == 0 {
            sqlx::query(
                "INSERT INTO aggregate_stats (user_id, domain, games_played, score_sum, \
                 best_score, worst_score, total_play_secs, counters, current_streak, \
                 longest_streak, current_failure_streak, longest_failure_streak, \
                 recent_outcomes, unlocked_achievements, last_unlocked, version, created_at, \
                 updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                 $17, $18) \
                 ON CONFLICT (user_id, domain) DO NOTHING",
            )
            .bind(row.user_id)
            .bind(&row.domain)
            .bind(row.games_played)
            .bind(row.score_sum)
            .bind(row.best_score)
            .bind(row.worst_score)
            .bind(row.total_play_secs)
            .bind(&row.counters)
            .bind(row.current_streak)
            .bind(row.longest_streak)
            .bind(row.current_failure_streak)
            .bind(row.longest_failure_streak)
            .bind(&row.recent_outcomes)
            .bind(&row.unlocked_achievements)
            .bind(&row.last_unlocked)
            .bind(next_version)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE aggregate_stats SET games_played = $3, score_sum = $4, best_score = $5, \
                 worst_score = $6, total_play_secs = $7, counters = $8, current_streak = $9, \
                 longest_streak = $10, current_failure_streak = $11, \
                 longest_failure_streak = $12, recent_outcomes = $13, \
                 unlocked_achievements = $14, last_unlocked = $15, version = $16, \
                 updated_at = $17 \
                 WHERE user_id = $1 AND domain = $2 AND version = $18",
            )
            .bind(row.user_id)
            .bind(&row.domain)
            .bind(row.games_played)
            .bind(row.score_sum)
            .bind(row.best_score)
            .bind(row.worst_score)
            .bind(row.total_play_secs)
            .bind(&row.counters)
            .bind(row.current_streak)
            .bind(row.longest_streak)
            .bind(row.current_failure_streak)
            .bind(row.longest_failure_streak)
            .bind(&row.recent_outcomes)
            .bind(&row.unlocked_achievements)
            .bind(&row.last_unlocked)
            .bind(next_version)
            .bind(row.updated_at)
            .bind(stats.version)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(LedgerError::ConcurrencyConflict {
                user_id: stats.user_id,
                domain: stats.domain,
            });
        }
        Ok(next_version)
    }

    async fn top(
        &self,
        domain: GameDomain,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AggregateStats>, LedgerError> {
        let query = format!(
            "SELECT {STATS_FIELDS} FROM aggregate_stats WHERE domain = $1 \
             ORDER BY score_sum DESC, games_played DESC, user_id ASC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, StatsRow>(&query)
            .bind(domain.as_str())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(AggregateStats::try_from).collect()
    }

    async fn count(&self, domain: GameDomain) -> Result<u64, LedgerError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM aggregate_stats WHERE domain = $1",
        )
        .bind(domain.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[async_trait]
impl SwipeRepository for PostgresStore {
    async fn insert_swipe(&self, swipe: &SwipeAction) -> Result<bool, LedgerError> {
        let result = sqlx::query(
            "INSERT INTO swipe_actions (swiper_id, swiped_user_id, is_like, swiped_at) \
             VALUES ($1, $2, $3, $4) ON CONFLICT (swiper_id, swiped_user_id) DO NOTHING",
        )
        .bind(swipe.swiper_id.as_uuid())
        .bind(swipe.swiped_user_id.as_uuid())
        .bind(swipe.is_like)
        .bind(swipe.swiped_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_swipe(
        &self,
        swiper_id: UserId,
        swiped_user_id: UserId,
    ) -> Result<Option<SwipeAction>, LedgerError> {
        let row = sqlx::query_as::<_, SwipeRow>(
            "SELECT swiper_id, swiped_user_id, is_like, swiped_at FROM swipe_actions \
             WHERE swiper_id = $1 AND swiped_user_id = $2",
        )
        .bind(swiper_id.as_uuid())
        .bind(swiped_user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SwipeAction::from))
    }

    async fn insert_match_if_absent(&self, candidate: Match) -> Result<MatchInsert, LedgerError> {
        let query = format!(
            "INSERT INTO matches ({MATCH_FIELDS}) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user1_id, user2_id) DO NOTHING RETURNING {MATCH_FIELDS}"
        );
        let inserted = sqlx::query_as::<_, MatchRow>(&query)
            .bind(candidate.match_id.as_uuid())
            .bind(candidate.user1_id.as_uuid())
            .bind(candidate.user2_id.as_uuid())
            .bind(candidate.matched_at)
            .bind(candidate.is_active)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok(MatchInsert::Created(Match::from(row)));
        }

        // Lost the race: the winner's row is committed, so it is visible now.
        self.find_match(candidate.pair())
            .await?
            .map(MatchInsert::Existing)
            .ok_or_else(|| {
                LedgerError::Internal(format!(
                    "match conflict for {} / {} but no row found",
                    candidate.user1_id, candidate.user2_id
                ))
            })
    }

    async fn find_match(&self, pair: UserPair) -> Result<Option<Match>, LedgerError> {
        let query =
            format!("SELECT {MATCH_FIELDS} FROM matches WHERE user1_id = $1 AND user2_id = $2");
        let row = sqlx::query_as::<_, MatchRow>(&query)
            .bind(pair.user1().as_uuid())
            .bind(pair.user2().as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Match::from))
    }

    async fn list_matches(
        &self,
        user_id: UserId,
        active_only: bool,
    ) -> Result<Vec<Match>, LedgerError> {
        let query = format!(
            "SELECT {MATCH_FIELDS} FROM matches \
             WHERE (user1_id = $1 OR user2_id = $1) AND (is_active OR NOT $2) \
             ORDER BY matched_at DESC"
        );
        let rows = sqlx::query_as::<_, MatchRow>(&query)
            .bind(user_id.as_uuid())
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Match::from).collect())
    }

    async fn deactivate_match(&self, pair: UserPair) -> Result<Option<Match>, LedgerError> {
        let query = format!(
            "UPDATE matches SET is_active = FALSE \
             WHERE user1_id = $1 AND user2_id = $2 AND is_active RETURNING {MATCH_FIELDS}"
        );
        let row = sqlx::query_as::<_, MatchRow>(&query)
            .bind(pair.user1().as_uuid())
            .bind(pair.user2().as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Match::from))
    }
}
