//! Incoming game events and their validation.
//!
//! Domain services submit a [`GameEvent`] once an action resolves. The only
//! way to obtain a [`ValidatedEvent`] is [`validate`], so everything past
//! the ingestion step can rely on the domain invariants holding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{GameDomain, UserId};

/// Domain-specific data attached to a game event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// A settled bet.
    Casino {
        /// Points put at stake. Must be positive.
        wager: i64,
        /// Whether the player's guess was correct.
        won: bool,
    },
    /// A finished run.
    BugChase {
        /// Seconds survived before the run ended.
        survival_secs: i64,
        /// Bugs squashed during the run.
        #[serde(default)]
        bugs_squashed: i64,
    },
    /// A graded roast submission.
    CodeRoast {
        /// Language of the submitted snippet.
        language: String,
        /// Size of the submitted snippet.
        #[serde(default)]
        lines_of_code: i64,
    },
    /// A completed profile analysis.
    #[serde(rename = "github_analysis")]
    GitHubAnalysis {
        /// GitHub login that was analyzed.
        username: String,
        /// Number of repositories that went into the analysis.
        #[serde(default)]
        repos_analyzed: i64,
    },
    /// A logged excuse.
    MeetingExcuse {
        /// Excuse category (e.g. `"technical"`, `"family"`).
        category: String,
    },
}

impl EventPayload {
    /// Returns the domain this payload belongs to.
    #[must_use]
    pub const fn domain(&self) -> GameDomain {
        match self {
            Self::Casino { .. } => GameDomain::Casino,
            Self::BugChase { .. } => GameDomain::BugChase,
            Self::CodeRoast { .. } => GameDomain::CodeRoast,
            Self::GitHubAnalysis { .. } => GameDomain::GitHubAnalysis,
            Self::MeetingExcuse { .. } => GameDomain::MeetingExcuse,
        }
    }
}

/// A resolved game action, as submitted by a domain service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    /// Player the event belongs to.
    pub user_id: UserId,
    /// Minigame that produced the event.
    pub domain: GameDomain,
    /// Outcome score; its valid range depends on the domain.
    pub outcome_score: i64,
    /// When the action resolved.
    pub occurred_at: DateTime<Utc>,
    /// Time spent on the action, if the domain measures it.
    #[serde(default)]
    pub duration_secs: Option<i64>,
    /// Domain-specific data.
    pub payload: EventPayload,
}

/// A single violated field of a rejected event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Dotted path of the offending field (e.g. `"payload.wager"`).
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

/// Every field violation found while validating one event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid event: {}", format_violations(.violations))]
pub struct InvalidEventError {
    /// Violations in the order they were detected. Never empty.
    pub violations: Vec<FieldViolation>,
}

impl InvalidEventError {
    /// Creates an error with a single violation.
    #[must_use]
    pub fn single(field: &str, reason: &str) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.to_string(),
                reason: reason.to_string(),
            }],
        }
    }

    /// Returns `true` if `field` is among the violations.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} {}", v.field, v.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A [`GameEvent`] that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEvent {
    user_id: UserId,
    domain: GameDomain,
    outcome_score: u64,
    occurred_at: DateTime<Utc>,
    duration_secs: u64,
    payload: EventPayload,
}

impl ValidatedEvent {
    /// Player the event belongs to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Minigame that produced the event.
    #[must_use]
    pub const fn domain(&self) -> GameDomain {
        self.domain
    }

    /// Outcome score, within the domain's range.
    #[must_use]
    pub const fn outcome_score(&self) -> u64 {
        self.outcome_score
    }

    /// When the action resolved.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Time spent on the action (0 when not measured).
    #[must_use]
    pub const fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Domain-specific data.
    #[must_use]
    pub const fn payload(&self) -> &EventPayload {
        &self.payload
    }
}

/// Checks an event against its domain's invariants.
///
/// Pure: touches no state. User existence is checked separately by the
/// ledger service, which owns the user directory.
///
/// # Errors
///
/// Returns an [`InvalidEventError`] listing every violated field.
pub fn validate(event: GameEvent) -> Result<ValidatedEvent, InvalidEventError> {
    let mut violations = Vec::new();
    let mut violate = |field: &str, reason: &str| {
        violations.push(FieldViolation {
            field: field.to_string(),
            reason: reason.to_string(),
        });
    };

    let range = event.domain.score_range();
    if !range.contains(event.outcome_score) {
        violate("outcome_score", range.describe());
    }
    if event.duration_secs.is_some_and(|d| d < 0) {
        violate("duration_secs", "must be non-negative");
    }

    if event.payload.domain() != event.domain {
        violate("payload.kind", "does not match the event domain");
    } else {
        match &event.payload {
            EventPayload::Casino { wager, won } => {
                if *wager <= 0 {
                    violate("payload.wager", "must be positive");
                }
                if !won && event.outcome_score > 0 {
                    violate("outcome_score", "must be 0 for a lost bet");
                }
            }
            EventPayload::BugChase {
                survival_secs,
                bugs_squashed,
            } => {
                if *survival_secs < 0 {
                    violate("payload.survival_secs", "must be non-negative");
                }
                if *bugs_squashed < 0 {
                    violate("payload.bugs_squashed", "must be non-negative");
                }
            }
            EventPayload::CodeRoast {
                language,
                lines_of_code,
            } => {
                if language.trim().is_empty() {
                    violate("payload.language", "is required");
                }
                if *lines_of_code < 0 {
                    violate("payload.lines_of_code", "must be non-negative");
                }
            }
            EventPayload::GitHubAnalysis {
                username,
                repos_analyzed,
            } => {
                if username.trim().is_empty() {
                    violate("payload.username", "is required");
                }
                if *repos_analyzed < 0 {
                    violate("payload.repos_analyzed", "must be non-negative");
                }
            }
            EventPayload::MeetingExcuse { category } => {
                if category.trim().is_empty() {
                    violate("payload.category", "is required");
                }
            }
        }
    }

    if !violations.is_empty() {
        return Err(InvalidEventError { violations });
    }

    Ok(ValidatedEvent {
        user_id: event.user_id,
        domain: event.domain,
        outcome_score: non_negative(event.outcome_score),
        occurred_at: event.occurred_at,
        duration_secs: event.duration_secs.map_or(0, non_negative),
        payload: event.payload,
    })
}

/// Converts an already range-checked value to `u64`.
pub(crate) fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn roast_event(score: i64) -> GameEvent {
        GameEvent {
            user_id: UserId::new(),
            domain: GameDomain::CodeRoast,
            outcome_score: score,
            occurred_at: Utc::now(),
            duration_secs: Some(30),
            payload: EventPayload::CodeRoast {
                language: "rust".to_string(),
                lines_of_code: 42,
            },
        }
    }

    #[test]
    fn accepts_valid_roast() {
        let Ok(validated) = validate(roast_event(80)) else {
            panic!("expected valid event");
        };
        assert_eq!(validated.outcome_score(), 80);
        assert_eq!(validated.duration_secs(), 30);
        assert_eq!(validated.domain(), GameDomain::CodeRoast);
    }

    #[test]
    fn rejects_score_above_percent_range() {
        let Err(err) = validate(roast_event(101)) else {
            panic!("expected rejection");
        };
        assert!(err.has_field("outcome_score"));
    }

    #[test]
    fn collects_every_violation() {
        let mut event = roast_event(-3);
        event.duration_secs = Some(-1);
        event.payload = EventPayload::CodeRoast {
            language: "  ".to_string(),
            lines_of_code: 10,
        };
        let Err(err) = validate(event) else {
            panic!("expected rejection");
        };
        assert_eq!(err.violations.len(), 3);
        assert!(err.has_field("outcome_score"));
        assert!(err.has_field("duration_secs"));
        assert!(err.has_field("payload.language"));
        assert!(err.to_string().contains("payload.language is required"));
    }

    #[test]
    fn rejects_payload_for_other_domain() {
        let mut event = roast_event(50);
        event.payload = EventPayload::MeetingExcuse {
            category: "family".to_string(),
        };
        let Err(err) = validate(event) else {
            panic!("expected rejection");
        };
        assert!(err.has_field("payload.kind"));
    }

    #[test]
    fn casino_requires_positive_wager_and_zero_score_on_loss() {
        let event = GameEvent {
            user_id: UserId::new(),
            domain: GameDomain::Casino,
            outcome_score: 20,
            occurred_at: Utc::now(),
            duration_secs: None,
            payload: EventPayload::Casino {
                wager: 0,
                won: false,
            },
        };
        let Err(err) = validate(event) else {
            panic!("expected rejection");
        };
        assert!(err.has_field("payload.wager"));
        assert!(err.has_field("outcome_score"));
    }

    #[test]
    fn bug_chase_allows_large_distances() {
        let event = GameEvent {
            user_id: UserId::new(),
            domain: GameDomain::BugChase,
            outcome_score: 25_000,
            occurred_at: Utc::now(),
            duration_secs: None,
            payload: EventPayload::BugChase {
                survival_secs: 95,
                bugs_squashed: 12,
            },
        };
        let Ok(validated) = validate(event) else {
            panic!("expected valid event");
        };
        assert_eq!(validated.outcome_score(), 25_000);
        assert_eq!(validated.duration_secs(), 0);
    }

    #[test]
    fn payload_deserializes_from_tagged_json() {
        let json = r#"{"kind":"github_analysis","username":"octocat"}"#;
        let Ok(payload) = serde_json::from_str::<EventPayload>(json) else {
            panic!("deserialization failed");
        };
        assert_eq!(payload.domain(), GameDomain::GitHubAnalysis);
    }
}
