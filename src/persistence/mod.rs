//! Persistence layer: repository traits with in-memory and PostgreSQL
//! implementations.
//!
//! The service layer only talks to the traits below. Each trait method is a
//! single atomic operation at the storage layer; in particular
//! [`StatsRepository::save`] is a compare-and-swap on the row version and
//! [`SwipeRepository::insert_swipe`] / [`SwipeRepository::insert_match_if_absent`]
//! are conditional inserts, never read-then-write pairs.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    AggregateStats, GameDomain, Match, MatchInsert, StatsKey, SwipeAction, UserId, UserPair,
    UserProfile,
};
use crate::error::LedgerError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Registered users, used for referential checks at ingestion time.
#[async_trait]
pub trait UserDirectory: Send + Sync + Debug {
    /// Stores a new user.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserAlreadyExists`] if the id is taken, or
    /// [`LedgerError::PersistenceError`] on storage failure.
    async fn register(&self, user: &UserProfile) -> Result<(), LedgerError>;

    /// Looks up a user.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn get(&self, user_id: UserId) -> Result<Option<UserProfile>, LedgerError>;

    /// Returns `true` if the user exists.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn exists(&self, user_id: UserId) -> Result<bool, LedgerError> {
        Ok(self.get(user_id).await?.is_some())
    }
}

/// Keyed store of `(user, domain) → AggregateStats`.
#[async_trait]
pub trait StatsRepository: Send + Sync + Debug {
    /// Loads one row.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn load(&self, key: StatsKey) -> Result<Option<AggregateStats>, LedgerError>;

    /// Loads every row of a user, ordered by domain.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn load_user(&self, user_id: UserId) -> Result<Vec<AggregateStats>, LedgerError>;

    /// Commits `stats` if the stored version still equals `stats.version`
    /// (version 0 means the row must not exist yet). Returns the new
    /// version.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ConcurrencyConflict`] if another writer
    /// committed first, or [`LedgerError::PersistenceError`] on storage
    /// failure.
    async fn save(&self, stats: &AggregateStats) -> Result<i64, LedgerError>;

    /// Top rows of a domain by score sum (ties: more games first, then
    /// user id).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn top(
        &self,
        domain: GameDomain,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AggregateStats>, LedgerError>;

    /// Number of rows in a domain.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn count(&self, domain: GameDomain) -> Result<u64, LedgerError>;
}

/// Swipes and matches.
#[async_trait]
pub trait SwipeRepository: Send + Sync + Debug {
    /// Inserts a swipe unless one already exists for the ordered pair.
    /// Returns `false` (and changes nothing) on conflict.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn insert_swipe(&self, swipe: &SwipeAction) -> Result<bool, LedgerError>;

    /// Looks up the swipe of `swiper_id` on `swiped_user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn find_swipe(
        &self,
        swiper_id: UserId,
        swiped_user_id: UserId,
    ) -> Result<Option<SwipeAction>, LedgerError>;

    /// Inserts `candidate` unless its pair is already matched, in which case
    /// the stored match is returned as [`MatchInsert::Existing`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn insert_match_if_absent(&self, candidate: Match) -> Result<MatchInsert, LedgerError>;

    /// Looks up the match of a pair, active or not.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn find_match(&self, pair: UserPair) -> Result<Option<Match>, LedgerError>;

    /// Matches involving `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn list_matches(
        &self,
        user_id: UserId,
        active_only: bool,
    ) -> Result<Vec<Match>, LedgerError>;

    /// Marks an active match inactive. Returns the updated match, or `None`
    /// if the pair had no active match.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on storage failure.
    async fn deactivate_match(&self, pair: UserPair) -> Result<Option<Match>, LedgerError>;
}

/// The three repositories the services depend on.
#[derive(Debug, Clone)]
pub struct Stores {
    /// User directory.
    pub users: Arc<dyn UserDirectory>,
    /// Stats rows.
    pub stats: Arc<dyn StatsRepository>,
    /// Swipes and matches.
    pub swipes: Arc<dyn SwipeRepository>,
}

impl Stores {
    /// All repositories backed by one shared [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: Arc::clone(&store) as Arc<dyn UserDirectory>,
            stats: Arc::clone(&store) as Arc<dyn StatsRepository>,
            swipes: store,
        }
    }

    /// All repositories backed by one PostgreSQL pool.
    #[must_use]
    pub fn postgres(store: PostgresStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: Arc::clone(&store) as Arc<dyn UserDirectory>,
            stats: Arc::clone(&store) as Arc<dyn StatsRepository>,
            swipes: store,
        }
    }
}
