//! Service layer: business logic orchestration.
//!
//! [`LedgerService`] runs the game event pipeline and serves stats reads;
//! [`MatchService`] owns swipes and matches. Both publish through the
//! shared [`super::domain::EventBus`] after every commit.

pub mod ledger_service;
pub mod match_service;

pub use ledger_service::{EventOutcome, Leaderboard, LedgerService, RankedStats};
pub use match_service::MatchService;
