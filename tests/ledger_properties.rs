//! Service-level properties of the ledger and match engine, run against
//! the in-memory store.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;

use arcade_ledger::app_state::AppState;
use arcade_ledger::config::LedgerConfig;
use arcade_ledger::domain::{
    EventPayload, GameDomain, GameEvent, RECENT_OUTCOMES_CAPACITY, SwipeOutcome, UserId,
};
use arcade_ledger::error::LedgerError;
use arcade_ledger::persistence::Stores;
use chrono::Utc;

fn state() -> AppState {
    AppState::new(Stores::in_memory(), &LedgerConfig::default())
}

async fn register(state: &AppState, name: &str) -> UserId {
    let Ok(profile) = state.ledger_service.register_user(name, None).await else {
        panic!("registration failed");
    };
    profile.user_id
}

fn bug_chase(user_id: UserId, survival_secs: i64) -> GameEvent {
    GameEvent {
        user_id,
        domain: GameDomain::BugChase,
        outcome_score: survival_secs * 10,
        occurred_at: Utc::now(),
        duration_secs: Some(survival_secs),
        payload: EventPayload::BugChase {
            survival_secs,
            bugs_squashed: 3,
        },
    }
}

fn casino(user_id: UserId, wager: i64, won: bool) -> GameEvent {
    GameEvent {
        user_id,
        domain: GameDomain::Casino,
        outcome_score: if won { wager * 2 } else { 0 },
        occurred_at: Utc::now(),
        duration_secs: None,
        payload: EventPayload::Casino { wager, won },
    }
}

#[tokio::test]
async fn n_events_give_exact_count_sum_and_window() {
    let state = state();
    let user = register(&state, "runner").await;

    let survivals: Vec<i64> = (1..=25).collect();
    for s in &survivals {
        let Ok(_) = state.ledger_service.record_event(bug_chase(user, *s)).await else {
            panic!("event rejected");
        };
    }

    let Ok(stats) = state.ledger_service.stats(user, GameDomain::BugChase).await else {
        panic!("stats missing");
    };
    let expected_sum: u64 = survivals.iter().map(|s| (*s as u64) * 10).sum();
    assert_eq!(stats.games_played, 25);
    assert_eq!(stats.score_sum, expected_sum);
    let Some(avg) = stats.average_score() else {
        panic!("average missing");
    };
    assert!((avg - expected_sum as f64 / 25.0).abs() < f64::EPSILON);

    assert_eq!(stats.recent_outcomes.len(), RECENT_OUTCOMES_CAPACITY);
    let expected_window: Vec<u64> = (16..=25).map(|s| s * 10).collect();
    assert_eq!(stats.recent_outcomes.to_vec(), expected_window);
    assert_eq!(stats.counter("bugs_squashed"), 75);
}

#[tokio::test]
async fn streaks_follow_success_threshold() {
    let state = state();
    let user = register(&state, "runner").await;

    // Default bug chase threshold is 60 seconds of survival.
    let mut previous_longest = 0;
    for (survival, expected_current) in [(90, 1), (120, 2), (30, 0), (61, 1)] {
        let Ok(outcome) = state
            .ledger_service
            .record_event(bug_chase(user, survival))
            .await
        else {
            panic!("event rejected");
        };
        let streak = outcome.stats.streak;
        assert_eq!(streak.current, expected_current);
        assert!(streak.longest >= streak.current);
        assert!(streak.longest >= previous_longest);
        previous_longest = streak.longest;
    }
    assert_eq!(previous_longest, 2);
}

#[tokio::test]
async fn casino_tracks_failure_streak_and_unlocks_on_tilt() {
    let state = state();
    let user = register(&state, "gambler").await;

    let mut unlocked = Vec::new();
    for _ in 0..5 {
        let Ok(outcome) = state.ledger_service.record_event(casino(user, 100, false)).await else {
            panic!("event rejected");
        };
        unlocked.extend(outcome.newly_unlocked);
    }
    let Ok(stats) = state.ledger_service.stats(user, GameDomain::Casino).await else {
        panic!("stats missing");
    };
    assert_eq!(stats.streak.current_failures, 5);
    assert_eq!(stats.streak.longest_failures, 5);
    assert!(unlocked.contains(&"casino.on_tilt".to_string()));

    let Ok(win) = state.ledger_service.record_event(casino(user, 100, true)).await else {
        panic!("event rejected");
    };
    assert_eq!(win.stats.streak.current, 1);
    assert_eq!(win.stats.streak.current_failures, 0);
    assert_eq!(win.stats.streak.longest_failures, 5);
}

#[tokio::test]
async fn achievement_sets_only_grow() {
    let state = state();
    let user = register(&state, "roaster").await;

    let mut seen = std::collections::BTreeSet::new();
    for score in [100, 10, 90, 0, 75, 95, 20] {
        let event = GameEvent {
            user_id: user,
            domain: GameDomain::CodeRoast,
            outcome_score: score,
            occurred_at: Utc::now(),
            duration_secs: None,
            payload: EventPayload::CodeRoast {
                language: "go".to_string(),
                lines_of_code: 10,
            },
        };
        let Ok(outcome) = state.ledger_service.record_event(event).await else {
            panic!("event rejected");
        };
        assert!(seen.is_subset(&outcome.stats.unlocked_achievements));
        for id in &outcome.newly_unlocked {
            assert!(!seen.contains(id), "{id} reported twice");
        }
        seen.clone_from(&outcome.stats.unlocked_achievements);
    }
    assert!(seen.contains("first_game"));
    assert!(seen.contains("perfect_score"));
}

#[tokio::test]
async fn domains_of_one_user_are_independent() {
    let state = state();
    let user = register(&state, "polymath").await;

    let _ = state.ledger_service.record_event(bug_chase(user, 100)).await;
    let _ = state.ledger_service.record_event(casino(user, 50, true)).await;

    let Ok(rows) = state.ledger_service.user_stats(user).await else {
        panic!("user stats failed");
    };
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.games_played == 1));
}

#[tokio::test]
async fn parallel_events_across_users_and_domains() {
    let state = state();
    let mut users = Vec::new();
    for i in 0..4 {
        users.push(register(&state, &format!("player-{i}")).await);
    }

    let service = Arc::clone(&state.ledger_service);
    let mut handles = Vec::new();
    for user in users.clone() {
        for _ in 0..10 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let a = service.record_event(bug_chase(user, 70)).await;
                let b = service.record_event(casino(user, 10, true)).await;
                a.is_ok() && b.is_ok()
            }));
        }
    }
    for handle in handles {
        let Ok(true) = handle.await else {
            panic!("event failed");
        };
    }

    for user in users {
        for domain in [GameDomain::BugChase, GameDomain::Casino] {
            let Ok(stats) = state.ledger_service.stats(user, domain).await else {
                panic!("stats missing");
            };
            assert_eq!(stats.games_played, 10);
            assert_eq!(stats.streak.current, 10);
        }
    }
}

#[tokio::test]
async fn invalid_event_reports_every_violation() {
    let state = state();
    let user = register(&state, "sloppy").await;
    let event = GameEvent {
        user_id: user,
        domain: GameDomain::Casino,
        outcome_score: -5,
        occurred_at: Utc::now(),
        duration_secs: Some(-1),
        payload: EventPayload::Casino {
            wager: 0,
            won: true,
        },
    };
    let Err(LedgerError::InvalidEvent(err)) = state.ledger_service.record_event(event).await else {
        panic!("expected InvalidEvent");
    };
    assert!(err.has_field("outcome_score"));
    assert!(err.has_field("duration_secs"));
    assert!(err.has_field("payload.wager"));
}

#[tokio::test]
async fn concurrent_mutual_likes_always_yield_one_match() {
    for _ in 0..50 {
        let state = state();
        let a = register(&state, "a").await;
        let b = register(&state, "b").await;

        let s1 = Arc::clone(&state.match_service);
        let s2 = Arc::clone(&state.match_service);
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { s1.record_swipe(a, b, true).await }),
            tokio::spawn(async move { s2.record_swipe(b, a, true).await }),
        );
        let (Ok(Ok(o1)), Ok(Ok(o2))) = (r1, r2) else {
            panic!("swipe failed");
        };
        let matched: Vec<_> = [o1, o2]
            .into_iter()
            .filter_map(|o| match o {
                SwipeOutcome::Matched(m) => Some(m.match_id),
                SwipeOutcome::NoMatch => None,
            })
            .collect();
        assert!(!matched.is_empty());
        assert!(matched.iter().all(|id| *id == matched[0]));

        let Ok(for_a) = state.match_service.list_matches(a).await else {
            panic!("list failed");
        };
        let Ok(for_b) = state.match_service.list_matches(b).await else {
            panic!("list failed");
        };
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a, for_b);
    }
}

#[tokio::test]
async fn duplicate_swipe_changes_nothing() {
    let state = state();
    let a = register(&state, "a").await;
    let b = register(&state, "b").await;

    let Ok(SwipeOutcome::NoMatch) = state.match_service.record_swipe(a, b, false).await else {
        panic!("pass should not match");
    };
    let retry = state.match_service.record_swipe(a, b, true).await;
    assert!(matches!(retry, Err(LedgerError::DuplicateSwipe { .. })));

    // The original pass still stands, so B's like cannot match.
    let Ok(SwipeOutcome::NoMatch) = state.match_service.record_swipe(b, a, true).await else {
        panic!("pass must still block the match");
    };
}
