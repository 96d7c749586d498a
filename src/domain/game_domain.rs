//! Minigame categories and their scoring rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One minigame category that feeds the ledger.
///
/// Every [`super::AggregateStats`] row is keyed by a user and one of these
/// domains; stats of different domains never interact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum GameDomain {
    /// Betting-style code challenge: guess the outcome, wager points.
    #[serde(rename = "casino")]
    Casino,
    /// Runner-style survival game.
    #[serde(rename = "bug_chase")]
    BugChase,
    /// AI-graded code roast.
    #[serde(rename = "code_roast")]
    CodeRoast,
    /// GitHub personality analyzer.
    #[serde(rename = "github_analysis")]
    GitHubAnalysis,
    /// Meeting excuse generator, graded for believability.
    #[serde(rename = "meeting_excuse")]
    MeetingExcuse,
}

/// Range an event's outcome score must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreRange {
    /// Graded domains: `0..=100`.
    Percent,
    /// Distance, time or points domains: any value `>= 0`.
    NonNegative,
}

impl ScoreRange {
    /// Returns `true` if `score` lies within the range.
    #[must_use]
    pub const fn contains(self, score: i64) -> bool {
        match self {
            Self::Percent => score >= 0 && score <= 100,
            Self::NonNegative => score >= 0,
        }
    }

    /// Human-readable description used in validation messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Percent => "must be between 0 and 100",
            Self::NonNegative => "must be non-negative",
        }
    }
}

impl GameDomain {
    /// All domains in a stable order.
    pub const ALL: [Self; 5] = [
        Self::Casino,
        Self::BugChase,
        Self::CodeRoast,
        Self::GitHubAnalysis,
        Self::MeetingExcuse,
    ];

    /// Returns the storage/wire name of the domain.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casino => "casino",
            Self::BugChase => "bug_chase",
            Self::CodeRoast => "code_roast",
            Self::GitHubAnalysis => "github_analysis",
            Self::MeetingExcuse => "meeting_excuse",
        }
    }

    /// Returns the outcome score range the domain declares.
    #[must_use]
    pub const fn score_range(self) -> ScoreRange {
        match self {
            Self::Casino | Self::BugChase => ScoreRange::NonNegative,
            Self::CodeRoast | Self::GitHubAnalysis | Self::MeetingExcuse => ScoreRange::Percent,
        }
    }

    /// Whether the domain keeps a parallel streak of consecutive failures.
    #[must_use]
    pub const fn tracks_failure_streak(self) -> bool {
        matches!(self, Self::Casino | Self::CodeRoast)
    }
}

impl fmt::Display for GameDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown game domain: {s}"))
    }
}
