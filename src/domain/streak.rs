//! Streak tracking over consecutive events.
//!
//! Each domain decides what counts as a "success" via a
//! [`SuccessThreshold`]; [`update`] folds one outcome into the previous
//! [`StreakState`].

use serde::{Deserialize, Serialize};

use super::game_event::non_negative;
use super::{EventPayload, GameDomain, ValidatedEvent};

/// Current and longest runs of successes (and, for some domains, failures).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Consecutive successes ending with the latest event.
    pub current: u32,
    /// Longest success run ever observed.
    pub longest: u32,
    /// Consecutive failures ending with the latest event. Only maintained
    /// for domains that track a failure streak.
    pub current_failures: u32,
    /// Longest failure run ever observed.
    pub longest_failures: u32,
}

/// Predicate deciding whether an event counts as a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessThreshold {
    /// Outcome score must be at least this value.
    MinScore(u64),
    /// Run must have lasted at least this many seconds.
    MinSurvivalSecs(u64),
    /// The bet must have been won.
    Won,
}

impl SuccessThreshold {
    /// Returns `true` if `event` satisfies the threshold.
    #[must_use]
    pub fn is_met(self, event: &ValidatedEvent) -> bool {
        match self {
            Self::MinScore(min) => event.outcome_score() >= min,
            Self::MinSurvivalSecs(min) => match event.payload() {
                EventPayload::BugChase { survival_secs, .. } => non_negative(*survival_secs) >= min,
                _ => false,
            },
            Self::Won => matches!(event.payload(), EventPayload::Casino { won: true, .. }),
        }
    }
}

/// Per-domain success thresholds, loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakThresholds {
    /// Minimum roast score counted as a success.
    pub code_roast_min_score: u64,
    /// Minimum bug chase survival time counted as a success.
    pub bug_chase_min_survival_secs: u64,
    /// Minimum GitHub analysis score counted as a success.
    pub github_analysis_min_score: u64,
    /// Minimum excuse believability counted as a success.
    pub meeting_excuse_min_score: u64,
}

impl Default for StreakThresholds {
    fn default() -> Self {
        Self {
            code_roast_min_score: 70,
            bug_chase_min_survival_secs: 60,
            github_analysis_min_score: 50,
            meeting_excuse_min_score: 60,
        }
    }
}

impl StreakThresholds {
    /// Returns the success predicate for `domain`.
    #[must_use]
    pub const fn for_domain(&self, domain: GameDomain) -> SuccessThreshold {
        match domain {
            GameDomain::Casino => SuccessThreshold::Won,
            GameDomain::BugChase => {
                SuccessThreshold::MinSurvivalSecs(self.bug_chase_min_survival_secs)
            }
            GameDomain::CodeRoast => SuccessThreshold::MinScore(self.code_roast_min_score),
            GameDomain::GitHubAnalysis => {
                SuccessThreshold::MinScore(self.github_analysis_min_score)
            }
            GameDomain::MeetingExcuse => SuccessThreshold::MinScore(self.meeting_excuse_min_score),
        }
    }
}

/// Folds one outcome into the previous streak state.
///
/// The success run and the failure run never grow on the same event: a
/// success clears the failure run and a failure clears the success run.
#[must_use]
pub fn update(previous: StreakState, success: bool, tracks_failures: bool) -> StreakState {
    let mut next = previous;
    if success {
        next.current = previous.current.saturating_add(1);
        next.longest = previous.longest.max(next.current);
        next.current_failures = 0;
    } else {
        next.current = 0;
        if tracks_failures {
            next.current_failures = previous.current_failures.saturating_add(1);
            next.longest_failures = previous.longest_failures.max(next.current_failures);
        }
    }
    next
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{GameEvent, UserId, validate};
    use chrono::Utc;

    fn roast(score: i64) -> ValidatedEvent {
        let event = GameEvent {
            user_id: UserId::new(),
            domain: GameDomain::CodeRoast,
            outcome_score: score,
            occurred_at: Utc::now(),
            duration_secs: None,
            payload: EventPayload::CodeRoast {
                language: "go".to_string(),
                lines_of_code: 5,
            },
        };
        let Ok(validated) = validate(event) else {
            panic!("valid event");
        };
        validated
    }

    #[test]
    fn roast_scenario_80_60_95() {
        let threshold = StreakThresholds::default().for_domain(GameDomain::CodeRoast);
        let mut state = StreakState::default();
        let mut observed = Vec::new();
        for score in [80, 60, 95] {
            state = update(state, threshold.is_met(&roast(score)), true);
            observed.push((state.current, state.longest));
        }
        assert_eq!(observed, vec![(1, 1), (0, 1), (1, 1)]);
    }

    #[test]
    fn failure_streak_runs_in_parallel() {
        let mut state = StreakState::default();
        for success in [false, false, false, true, false] {
            state = update(state, success, true);
        }
        assert_eq!(state.current, 0);
        assert_eq!(state.longest, 1);
        assert_eq!(state.current_failures, 1);
        assert_eq!(state.longest_failures, 3);
    }

    #[test]
    fn failures_ignored_when_not_tracked() {
        let state = update(StreakState::default(), false, false);
        assert_eq!(state, StreakState::default());
    }

    #[test]
    fn longest_never_below_current() {
        let pattern = [true, true, false, true, true, true, false, true];
        let mut state = StreakState::default();
        for success in pattern {
            let before = state;
            state = update(state, success, true);
            assert!(state.longest >= state.current);
            assert!(state.longest >= before.longest);
            if success {
                assert_eq!(state.current, before.current + 1);
            } else {
                assert_eq!(state.current, 0);
            }
        }
        assert_eq!(state.longest, 3);
    }

    #[test]
    fn casino_success_is_a_won_bet() {
        let event = GameEvent {
            user_id: UserId::new(),
            domain: GameDomain::Casino,
            outcome_score: 0,
            occurred_at: Utc::now(),
            duration_secs: None,
            payload: EventPayload::Casino {
                wager: 10,
                won: true,
            },
        };
        let Ok(validated) = validate(event) else {
            panic!("valid event");
        };
        assert!(SuccessThreshold::Won.is_met(&validated));
        assert!(!SuccessThreshold::MinSurvivalSecs(1).is_met(&validated));
    }
}
