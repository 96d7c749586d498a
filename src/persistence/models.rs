//! Database row models and their conversion to domain types.
//!
//! Unsigned domain counters are stored as `BIGINT`/`INTEGER`; conversions
//! fail with [`LedgerError::PersistenceError`] instead of wrapping.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::{
    AggregateStats, GameDomain, Match, MatchId, RecentOutcomes, StreakState, SwipeAction, UserId,
    UserProfile,
};
use crate::error::LedgerError;

/// A row of the `aggregate_stats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatsRow {
    /// Owner of the row.
    pub user_id: Uuid,
    /// Domain wire name.
    pub domain: String,
    /// Number of events applied.
    pub games_played: i64,
    /// Exact sum of outcome scores.
    pub score_sum: i64,
    /// Highest outcome score.
    pub best_score: Option<i64>,
    /// Lowest outcome score.
    pub worst_score: Option<i64>,
    /// Total reported play time.
    pub total_play_secs: i64,
    /// Named domain counters.
    pub counters: Json<BTreeMap<String, u64>>,
    /// Current success streak.
    pub current_streak: i32,
    /// Longest success streak.
    pub longest_streak: i32,
    /// Current failure streak.
    pub current_failure_streak: i32,
    /// Longest failure streak.
    pub longest_failure_streak: i32,
    /// Recent outcomes, oldest first.
    pub recent_outcomes: Vec<i64>,
    /// Unlocked achievement ids.
    pub unlocked_achievements: Vec<String>,
    /// Achievements unlocked by the latest event.
    pub last_unlocked: Vec<String>,
    /// Optimistic concurrency token.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<StatsRow> for AggregateStats {
    type Error = LedgerError;

    fn try_from(row: StatsRow) -> Result<Self, Self::Error> {
        let domain = row
            .domain
            .parse::<GameDomain>()
            .map_err(LedgerError::PersistenceError)?;
        let recent = row
            .recent_outcomes
            .into_iter()
            .map(|v| to_u64(v, "recent_outcomes"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            user_id: UserId::from_uuid(row.user_id),
            domain,
            games_played: to_u64(row.games_played, "games_played")?,
            score_sum: to_u64(row.score_sum, "score_sum")?,
            best_score: row.best_score.map(|v| to_u64(v, "best_score")).transpose()?,
            worst_score: row.worst_score.map(|v| to_u64(v, "worst_score")).transpose()?,
            total_play_secs: to_u64(row.total_play_secs, "total_play_secs")?,
            counters: row.counters.0,
            streak: StreakState {
                current: to_u32(row.current_streak, "current_streak")?,
                longest: to_u32(row.longest_streak, "longest_streak")?,
                current_failures: to_u32(row.current_failure_streak, "current_failure_streak")?,
                longest_failures: to_u32(row.longest_failure_streak, "longest_failure_streak")?,
            },
            recent_outcomes: RecentOutcomes::from(recent),
            unlocked_achievements: row.unlocked_achievements.into_iter().collect(),
            last_unlocked: row.last_unlocked,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<&AggregateStats> for StatsRow {
    type Error = LedgerError;

    fn try_from(stats: &AggregateStats) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: *stats.user_id.as_uuid(),
            domain: stats.domain.as_str().to_string(),
            games_played: to_i64(stats.games_played, "games_played")?,
            score_sum: to_i64(stats.score_sum, "score_sum")?,
            best_score: stats.best_score.map(|v| to_i64(v, "best_score")).transpose()?,
            worst_score: stats.worst_score.map(|v| to_i64(v, "worst_score")).transpose()?,
            total_play_secs: to_i64(stats.total_play_secs, "total_play_secs")?,
            counters: Json(stats.counters.clone()),
            current_streak: to_i32(stats.streak.current, "current_streak")?,
            longest_streak: to_i32(stats.streak.longest, "longest_streak")?,
            current_failure_streak: to_i32(stats.streak.current_failures, "current_failure_streak")?,
            longest_failure_streak: to_i32(stats.streak.longest_failures, "longest_failure_streak")?,
            recent_outcomes: stats
                .recent_outcomes
                .iter()
                .map(|v| to_i64(*v, "recent_outcomes"))
                .collect::<Result<Vec<_>, _>>()?,
            unlocked_achievements: stats.unlocked_achievements.iter().cloned().collect(),
            last_unlocked: stats.last_unlocked.clone(),
            version: stats.version,
            created_at: stats.created_at,
            updated_at: stats.updated_at,
        })
    }
}

/// A row of the `swipe_actions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SwipeRow {
    /// User who swiped.
    pub swiper_id: Uuid,
    /// User who was swiped on.
    pub swiped_user_id: Uuid,
    /// Like or pass.
    pub is_like: bool,
    /// Swipe timestamp.
    pub swiped_at: DateTime<Utc>,
}

impl From<SwipeRow> for SwipeAction {
    fn from(row: SwipeRow) -> Self {
        Self {
            swiper_id: UserId::from_uuid(row.swiper_id),
            swiped_user_id: UserId::from_uuid(row.swiped_user_id),
            is_like: row.is_like,
            swiped_at: row.swiped_at,
        }
    }
}

/// A row of the `matches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
    /// Match identifier.
    pub match_id: Uuid,
    /// Smaller user id.
    pub user1_id: Uuid,
    /// Larger user id.
    pub user2_id: Uuid,
    /// Creation timestamp.
    pub matched_at: DateTime<Utc>,
    /// Soft-delete flag.
    pub is_active: bool,
}

impl From<MatchRow> for Match {
    fn from(row: MatchRow) -> Self {
        Self {
            match_id: MatchId::from_uuid(row.match_id),
            user1_id: UserId::from_uuid(row.user1_id),
            user2_id: UserId::from_uuid(row.user2_id),
            matched_at: row.matched_at,
            is_active: row.is_active,
        }
    }
}

/// A row of the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Player identifier.
    pub user_id: Uuid,
    /// Display name.
    pub display_name: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

fn to_u64(value: i64, column: &str) -> Result<u64, LedgerError> {
    u64::try_from(value)
        .map_err(|_| LedgerError::PersistenceError(format!("negative value in {column}")))
}

fn to_u32(value: i32, column: &str) -> Result<u32, LedgerError> {
    u32::try_from(value)
        .map_err(|_| LedgerError::PersistenceError(format!("negative value in {column}")))
}

fn to_i64(value: u64, column: &str) -> Result<i64, LedgerError> {
    i64::try_from(value)
        .map_err(|_| LedgerError::PersistenceError(format!("{column} exceeds BIGINT range")))
}

fn to_i32(value: u32, column: &str) -> Result<i32, LedgerError> {
    i32::try_from(value)
        .map_err(|_| LedgerError::PersistenceError(format!("{column} exceeds INTEGER range")))
}
