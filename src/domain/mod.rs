//! Domain layer: game events, aggregates, streaks, achievements, swipes
//! and the event system.
//!
//! Everything here is storage-agnostic. The pipeline stages are plain
//! functions over owned values so that the service layer can run them on a
//! private copy of a stats row and commit the result in one write.

pub mod achievement;
pub mod aggregate_stats;
pub mod event_bus;
pub mod game_domain;
pub mod game_event;
pub mod ids;
pub mod keyed_locks;
pub mod ledger_event;
pub mod streak;
pub mod swipe;
pub mod user;

pub use achievement::{Achievement, AchievementCatalog, AchievementInfo};
pub use aggregate_stats::{AggregateStats, RECENT_OUTCOMES_CAPACITY, RecentOutcomes, StatsKey};
pub use event_bus::EventBus;
pub use game_domain::{GameDomain, ScoreRange};
pub use game_event::{
    EventPayload, FieldViolation, GameEvent, InvalidEventError, ValidatedEvent, validate,
};
pub use ids::{MatchId, UserId};
pub use keyed_locks::KeyedLocks;
pub use ledger_event::LedgerEvent;
pub use streak::{StreakState, StreakThresholds, SuccessThreshold};
pub use swipe::{Match, MatchInsert, SwipeAction, SwipeOutcome, UserPair};
pub use user::UserProfile;
