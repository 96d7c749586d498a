//! Stats and leaderboard DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{AggregateStats, GameDomain, UserId};
use crate::service::RankedStats;

/// Snapshot of one `(user, domain)` stats row with derived averages.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Owner of the row.
    pub user_id: UserId,
    /// Domain of the row.
    pub domain: GameDomain,
    /// Number of events applied.
    pub games_played: u64,
    /// Exact sum of outcome scores.
    pub score_sum: u64,
    /// `score_sum / games_played`, absent before the first event.
    pub average_score: Option<f64>,
    /// Highest outcome score.
    pub best_score: Option<u64>,
    /// Lowest outcome score.
    pub worst_score: Option<u64>,
    /// Last outcomes, oldest first.
    pub recent_outcomes: Vec<u64>,
    /// Mean of `recent_outcomes`.
    pub recent_average: Option<f64>,
    /// Total reported play time.
    pub total_play_secs: u64,
    /// Domain counters.
    pub counters: BTreeMap<String, u64>,
    /// Consecutive successes ending with the latest event.
    pub current_streak: u32,
    /// Longest success run.
    pub longest_streak: u32,
    /// Consecutive failures ending with the latest event.
    pub current_failure_streak: u32,
    /// Longest failure run.
    pub longest_failure_streak: u32,
    /// Every achievement unlocked in this domain.
    pub unlocked_achievements: Vec<String>,
    /// Achievements unlocked by the latest event.
    pub last_unlocked: Vec<String>,
    /// Row version.
    pub version: i64,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<AggregateStats> for StatsResponse {
    fn from(stats: AggregateStats) -> Self {
        Self {
            user_id: stats.user_id,
            domain: stats.domain,
            games_played: stats.games_played,
            score_sum: stats.score_sum,
            average_score: stats.average_score(),
            best_score: stats.best_score,
            worst_score: stats.worst_score,
            recent_outcomes: stats.recent_outcomes.to_vec(),
            recent_average: stats.recent_outcomes.average(),
            total_play_secs: stats.total_play_secs,
            counters: stats.counters,
            current_streak: stats.streak.current,
            longest_streak: stats.streak.longest,
            current_failure_streak: stats.streak.current_failures,
            longest_failure_streak: stats.streak.longest_failures,
            unlocked_achievements: stats.unlocked_achievements.into_iter().collect(),
            last_unlocked: stats.last_unlocked,
            version: stats.version,
            updated_at: stats.updated_at,
        }
    }
}

/// Every stats row of a user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserStatsResponse {
    /// Player identifier.
    pub user_id: UserId,
    /// One entry per domain played, ordered by domain.
    pub domains: Vec<StatsResponse>,
}

/// One leaderboard row.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntryDto {
    /// 1-based rank.
    pub rank: u64,
    /// Player identifier.
    pub user_id: UserId,
    /// Exact sum of outcome scores.
    pub score_sum: u64,
    /// Number of events applied.
    pub games_played: u64,
    /// Mean outcome score.
    pub average_score: Option<f64>,
    /// Highest outcome score.
    pub best_score: Option<u64>,
    /// Longest success run.
    pub longest_streak: u32,
}

impl From<RankedStats> for LeaderboardEntryDto {
    fn from(ranked: RankedStats) -> Self {
        let stats = ranked.stats;
        Self {
            rank: ranked.rank,
            user_id: stats.user_id,
            score_sum: stats.score_sum,
            games_played: stats.games_played,
            average_score: stats.average_score(),
            best_score: stats.best_score,
            longest_streak: stats.streak.longest,
        }
    }
}

/// Paginated response for `GET /leaderboards/{domain}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Ranked domain.
    pub domain: GameDomain,
    /// Rows of the requested page.
    pub data: Vec<LeaderboardEntryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
