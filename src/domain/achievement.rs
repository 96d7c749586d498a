//! Static achievement catalog and the achievement engine.
//!
//! The catalog is an ordered list built once at startup. Evaluation walks
//! it in declaration order, so the unlock delta of an event is
//! deterministic for a given catalog.

use serde::Serialize;
use utoipa::ToSchema;

use super::aggregate_stats::counters;
use super::{AggregateStats, GameDomain, ScoreRange};

/// Predicate over a freshly updated stats row.
pub type AchievementPredicate = fn(&AggregateStats) -> bool;

/// One unlockable milestone.
#[derive(Debug, Clone)]
pub struct Achievement {
    /// Stable identifier stored in [`AggregateStats::unlocked_achievements`].
    pub id: &'static str,
    /// Display title.
    pub title: &'static str,
    /// What the player has to do.
    pub description: &'static str,
    /// Domain the achievement belongs to; `None` applies to every domain.
    pub domain: Option<GameDomain>,
    /// Unlock condition.
    pub predicate: AchievementPredicate,
}

impl Achievement {
    /// Returns `true` if this achievement can be earned in `domain`.
    #[must_use]
    pub fn applies_to(&self, domain: GameDomain) -> bool {
        self.domain.is_none_or(|d| d == domain)
    }
}

/// Serializable view of an [`Achievement`] (the predicate is omitted).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AchievementInfo {
    /// Stable identifier.
    pub id: &'static str,
    /// Display title.
    pub title: &'static str,
    /// What the player has to do.
    pub description: &'static str,
    /// Domain scope; `null` for achievements available everywhere.
    pub domain: Option<GameDomain>,
}

impl From<&Achievement> for AchievementInfo {
    fn from(a: &Achievement) -> Self {
        Self {
            id: a.id,
            title: a.title,
            description: a.description,
            domain: a.domain,
        }
    }
}

/// Ordered, read-only set of achievements.
#[derive(Debug, Clone)]
pub struct AchievementCatalog {
    entries: Vec<Achievement>,
}

impl AchievementCatalog {
    /// Creates a catalog from explicit entries, kept in the given order.
    #[must_use]
    pub fn new(entries: Vec<Achievement>) -> Self {
        Self { entries }
    }

    /// The catalog served in production.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            Achievement {
                id: "first_game",
                title: "Hello, World",
                description: "Finish your first game.",
                domain: None,
                predicate: |s| s.games_played >= 1,
            },
            Achievement {
                id: "regular",
                title: "Regular",
                description: "Play 10 games.",
                domain: None,
                predicate: |s| s.games_played >= 10,
            },
            Achievement {
                id: "veteran",
                title: "Veteran",
                description: "Play 50 games.",
                domain: None,
                predicate: |s| s.games_played >= 50,
            },
            Achievement {
                id: "hot_streak",
                title: "Hot Streak",
                description: "Succeed 3 times in a row.",
                domain: None,
                predicate: |s| s.streak.longest >= 3,
            },
            Achievement {
                id: "unstoppable",
                title: "Unstoppable",
                description: "Succeed 7 times in a row.",
                domain: None,
                predicate: |s| s.streak.longest >= 7,
            },
            Achievement {
                id: "perfect_score",
                title: "Flawless",
                description: "Score a perfect 100 in a graded game.",
                domain: None,
                predicate: |s| {
                    s.domain.score_range() == ScoreRange::Percent && s.best_score == Some(100)
                },
            },
            Achievement {
                id: "casino.high_roller",
                title: "High Roller",
                description: "Wager 1000 points in total.",
                domain: Some(GameDomain::Casino),
                predicate: |s| s.counter(counters::TOTAL_WAGERED) >= 1_000,
            },
            Achievement {
                id: "casino.on_tilt",
                title: "On Tilt",
                description: "Lose 5 bets in a row.",
                domain: Some(GameDomain::Casino),
                predicate: |s| s.streak.longest_failures >= 5,
            },
            Achievement {
                id: "bug_chase.survivor",
                title: "Survivor",
                description: "Reach a score of 1000 in a single run.",
                domain: Some(GameDomain::BugChase),
                predicate: |s| s.best_score.is_some_and(|b| b >= 1_000),
            },
            Achievement {
                id: "bug_chase.exterminator",
                title: "Exterminator",
                description: "Squash 100 bugs.",
                domain: Some(GameDomain::BugChase),
                predicate: |s| s.counter(counters::BUGS_SQUASHED) >= 100,
            },
            Achievement {
                id: "code_roast.clean_coder",
                title: "Clean Coder",
                description: "Average 80 or more over at least 5 roasts.",
                domain: Some(GameDomain::CodeRoast),
                predicate: |s| s.games_played >= 5 && s.average_score().is_some_and(|a| a >= 80.0),
            },
            Achievement {
                id: "code_roast.well_done",
                title: "Well Done",
                description: "Get roasted below the bar 3 times in a row.",
                domain: Some(GameDomain::CodeRoast),
                predicate: |s| s.streak.longest_failures >= 3,
            },
            Achievement {
                id: "github_analysis.repo_hoarder",
                title: "Repo Hoarder",
                description: "Have 50 repositories analyzed.",
                domain: Some(GameDomain::GitHubAnalysis),
                predicate: |s| s.counter(counters::REPOS_ANALYZED) >= 50,
            },
            Achievement {
                id: "meeting_excuse.serial_skipper",
                title: "Serial Skipper",
                description: "Log 20 meeting excuses.",
                domain: Some(GameDomain::MeetingExcuse),
                predicate: |s| s.games_played >= 20,
            },
        ])
    }

    /// Iterates entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.entries.iter().find(|a| a.id == id)
    }

    /// Unlocks every in-scope achievement whose predicate now holds.
    ///
    /// Already unlocked achievements are skipped, so unlocking is monotonic
    /// and never re-reported. Returns only the newly unlocked ids, in
    /// catalog order.
    pub fn evaluate(&self, stats: &mut AggregateStats) -> Vec<String> {
        let newly: Vec<String> = self
            .entries
            .iter()
            .filter(|a| a.applies_to(stats.domain))
            .filter(|a| !stats.unlocked_achievements.contains(a.id))
            .filter(|a| (a.predicate)(stats))
            .map(|a| a.id.to_string())
            .collect();
        stats
            .unlocked_achievements
            .extend(newly.iter().cloned());
        newly
    }
}

impl Default for AchievementCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
