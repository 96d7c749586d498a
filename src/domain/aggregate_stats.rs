//! Per-user, per-domain aggregate record and the stats aggregator.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::game_event::non_negative;
use super::{EventPayload, GameDomain, InvalidEventError, StreakState, UserId, ValidatedEvent};
use crate::error::LedgerError;

/// Number of outcomes kept in [`RecentOutcomes`].
pub const RECENT_OUTCOMES_CAPACITY: usize = 10;

/// Names of the domain counters kept in [`AggregateStats::counters`].
pub mod counters {
    /// Events that satisfied the domain's success predicate.
    pub const SUCCESSES: &str = "successes";
    /// Events that did not.
    pub const FAILURES: &str = "failures";
    /// Casino: bets won.
    pub const WINS: &str = "wins";
    /// Casino: bets lost.
    pub const LOSSES: &str = "losses";
    /// Casino: points put at stake.
    pub const TOTAL_WAGERED: &str = "total_wagered";
    /// Casino: points won.
    pub const TOTAL_WON: &str = "total_won";
    /// Bug chase: seconds survived across all runs.
    pub const TOTAL_SURVIVAL_SECS: &str = "total_survival_secs";
    /// Bug chase: bugs squashed across all runs.
    pub const BUGS_SQUASHED: &str = "bugs_squashed";
    /// Code roast: lines of code submitted.
    pub const LINES_ROASTED: &str = "lines_roasted";
    /// GitHub analysis: repositories analyzed.
    pub const REPOS_ANALYZED: &str = "repos_analyzed";
}

/// Storage key of an [`AggregateStats`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatsKey {
    /// Owner of the row.
    pub user_id: UserId,
    /// Domain of the row.
    pub domain: GameDomain,
}

impl StatsKey {
    /// Creates a key for `(user_id, domain)`.
    #[must_use]
    pub const fn new(user_id: UserId, domain: GameDomain) -> Self {
        Self { user_id, domain }
    }
}

/// Sliding window over the last [`RECENT_OUTCOMES_CAPACITY`] outcome scores,
/// oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u64>", into = "Vec<u64>")]
pub struct RecentOutcomes(VecDeque<u64>);

impl RecentOutcomes {
    /// Creates an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self(VecDeque::with_capacity(RECENT_OUTCOMES_CAPACITY))
    }

    /// Appends an outcome, evicting the oldest once the window is full.
    pub fn push(&mut self, outcome: u64) {
        if self.0.len() == RECENT_OUTCOMES_CAPACITY {
            self.0.pop_front();
        }
        self.0.push_back(outcome);
    }

    /// Iterates outcomes in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &u64> {
        self.0.iter()
    }

    /// Number of outcomes in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no outcome was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mean of the outcomes in the window.
    #[must_use]
    pub fn average(&self) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        let sum: u128 = self.0.iter().map(|v| u128::from(*v)).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg = sum as f64 / self.0.len() as f64;
        Some(avg)
    }

    /// Copies the window into a vector, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u64> {
        self.0.iter().copied().collect()
    }
}

impl From<Vec<u64>> for RecentOutcomes {
    /// Keeps only the newest [`RECENT_OUTCOMES_CAPACITY`] entries.
    fn from(values: Vec<u64>) -> Self {
        let mut window = Self::new();
        for v in values {
            window.push(v);
        }
        window
    }
}

impl From<RecentOutcomes> for Vec<u64> {
    fn from(window: RecentOutcomes) -> Self {
        window.0.into()
    }
}

/// Durable aggregate of every event a user produced in one domain.
///
/// Averages are not stored: [`AggregateStats::average_score`] divides the
/// exact integer sum by the play count at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Owner of the row.
    pub user_id: UserId,
    /// Domain of the row.
    pub domain: GameDomain,
    /// Number of events applied.
    pub games_played: u64,
    /// Exact sum of all outcome scores.
    pub score_sum: u64,
    /// Highest outcome score seen.
    pub best_score: Option<u64>,
    /// Lowest outcome score seen.
    pub worst_score: Option<u64>,
    /// Total time spent across events that reported a duration.
    pub total_play_secs: u64,
    /// Named domain counters (see [`counters`]).
    pub counters: BTreeMap<String, u64>,
    /// Success/failure streaks.
    pub streak: StreakState,
    /// Last outcomes, oldest first.
    pub recent_outcomes: RecentOutcomes,
    /// Every achievement unlocked so far.
    pub unlocked_achievements: BTreeSet<String>,
    /// Achievements unlocked by the most recent event, in catalog order.
    pub last_unlocked: Vec<String>,
    /// Optimistic concurrency token, bumped on every committed write.
    pub version: i64,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

impl AggregateStats {
    /// Creates an empty row for `key`. `version` 0 means "never stored".
    #[must_use]
    pub fn new(key: StatsKey) -> Self {
        let now = Utc::now();
        Self {
            user_id: key.user_id,
            domain: key.domain,
            games_played: 0,
            score_sum: 0,
            best_score: None,
            worst_score: None,
            total_play_secs: 0,
            counters: BTreeMap::new(),
            streak: StreakState::default(),
            recent_outcomes: RecentOutcomes::new(),
            unlocked_achievements: BTreeSet::new(),
            last_unlocked: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Storage key of this row.
    #[must_use]
    pub const fn key(&self) -> StatsKey {
        StatsKey::new(self.user_id, self.domain)
    }

    /// Mean outcome score over all events.
    #[must_use]
    pub fn average_score(&self) -> Option<f64> {
        if self.games_played == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let avg = self.score_sum as f64 / self.games_played as f64;
        Some(avg)
    }

    /// Value of a named counter (0 if never bumped).
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Applies one validated event: counts, sums, min/max, the recent
    /// window, play time and domain counters. Streaks and achievements are
    /// handled by the later pipeline stages.
    ///
    /// On error the row is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidEvent`] if the event belongs to another
    /// user or domain, or if a running total would overflow.
    pub fn apply(&mut self, event: &ValidatedEvent, success: bool) -> Result<(), LedgerError> {
        if event.user_id() != self.user_id || event.domain() != self.domain {
            return Err(InvalidEventError::single("domain", "does not match the stats row").into());
        }

        let mut next = self.clone();
        let score = event.outcome_score();

        next.games_played = checked(next.games_played, 1, "games_played")?;
        next.score_sum = checked(next.score_sum, score, "outcome_score")?;
        next.best_score = Some(next.best_score.map_or(score, |b| b.max(score)));
        next.worst_score = Some(next.worst_score.map_or(score, |w| w.min(score)));
        next.recent_outcomes.push(score);
        next.total_play_secs = checked(next.total_play_secs, event.duration_secs(), "duration_secs")?;

        next.bump(
            if success {
                counters::SUCCESSES
            } else {
                counters::FAILURES
            },
            1,
        )?;

        match event.payload() {
            EventPayload::Casino { wager, won } => {
                next.bump(if *won { counters::WINS } else { counters::LOSSES }, 1)?;
                next.bump(counters::TOTAL_WAGERED, non_negative(*wager))?;
                next.bump(counters::TOTAL_WON, score)?;
            }
            EventPayload::BugChase {
                survival_secs,
                bugs_squashed,
            } => {
                next.bump(counters::TOTAL_SURVIVAL_SECS, non_negative(*survival_secs))?;
                next.bump(counters::BUGS_SQUASHED, non_negative(*bugs_squashed))?;
            }
            EventPayload::CodeRoast { lines_of_code, .. } => {
                next.bump(counters::LINES_ROASTED, non_negative(*lines_of_code))?;
            }
            EventPayload::GitHubAnalysis { repos_analyzed, .. } => {
                next.bump(counters::REPOS_ANALYZED, non_negative(*repos_analyzed))?;
            }
            EventPayload::MeetingExcuse { .. } => {}
        }

        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    fn bump(&mut self, name: &str, by: u64) -> Result<(), LedgerError> {
        let current = self.counter(name);
        let value = checked(current, by, name)?;
        self.counters.insert(name.to_string(), value);
        Ok(())
    }
}

/// Upper bound of every running total. Rows are stored in signed 64-bit
/// columns.
const MAX_TOTAL: u64 = i64::MAX.unsigned_abs();

fn checked(total: u64, add: u64, field: &str) -> Result<u64, LedgerError> {
    total
        .checked_add(add)
        .filter(|sum| *sum <= MAX_TOTAL)
        .ok_or_else(|| InvalidEventError::single(field, "overflows the running total").into())
}
