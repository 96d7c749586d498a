//! In-memory implementation of the repositories.
//!
//! Every operation takes the relevant map lock exactly once, so conditional
//! inserts and version checks are atomic with respect to each other.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StatsRepository, SwipeRepository, UserDirectory};
use crate::domain::{
    AggregateStats, GameDomain, Match, MatchInsert, StatsKey, SwipeAction, UserId, UserPair,
    UserProfile,
};
use crate::error::LedgerError;

/// Process-local store used in tests and when persistence is disabled.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, UserProfile>>,
    stats: RwLock<HashMap<StatsKey, AggregateStats>>,
    swipes: RwLock<HashMap<(UserId, UserId), SwipeAction>>,
    matches: RwLock<HashMap<UserPair, Match>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn register(&self, user: &UserProfile) -> Result<(), LedgerError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.user_id) {
            return Err(LedgerError::UserAlreadyExists(user.user_id));
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<UserProfile>, LedgerError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }
}

#[async_trait]
impl StatsRepository for MemoryStore {
    async fn load(&self, key: StatsKey) -> Result<Option<AggregateStats>, LedgerError> {
        Ok(self.stats.read().await.get(&key).cloned())
    }

    async fn load_user(&self, user_id: UserId) -> Result<Vec<AggregateStats>, LedgerError> {
        let map = self.stats.read().await;
        Ok(GameDomain::ALL
            .into_iter()
            .filter_map(|domain| map.get(&StatsKey::new(user_id, domain)).cloned())
            .collect())
    }

    async fn save(&self, stats: &AggregateStats) -> Result<i64, LedgerError> {
        let key = stats.key();
        let mut map = self.stats.write().await;
        let stored_version = map.get(&key).map_or(0, |s| s.version);
        if stored_version != stats.version {
            return Err(LedgerError::ConcurrencyConflict {
                user_id: key.user_id,
                domain: key.domain,
            });
        }
        let mut committed = stats.clone();
        committed.version = stats.version.saturating_add(1);
        let version = committed.version;
        map.insert(key, committed);
        Ok(version)
    }

    async fn top(
        &self,
        domain: GameDomain,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AggregateStats>, LedgerError> {
        let map = self.stats.read().await;
        let mut rows: Vec<&AggregateStats> = map.values().filter(|s| s.domain == domain).collect();
        rows.sort_by_key(|s| (Reverse(s.score_sum), Reverse(s.games_played), s.user_id));
        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self, domain: GameDomain) -> Result<u64, LedgerError> {
        let map = self.stats.read().await;
        Ok(map.values().filter(|s| s.domain == domain).count() as u64)
    }
}

#[async_trait]
impl SwipeRepository for MemoryStore {
    async fn insert_swipe(&self, swipe: &SwipeAction) -> Result<bool, LedgerError> {
        let mut swipes = self.swipes.write().await;
        let key = (swipe.swiper_id, swipe.swiped_user_id);
        if swipes.contains_key(&key) {
            return Ok(false);
        }
        swipes.insert(key, *swipe);
        Ok(true)
    }

    async fn find_swipe(
        &self,
        swiper_id: UserId,
        swiped_user_id: UserId,
    ) -> Result<Option<SwipeAction>, LedgerError> {
        Ok(self
            .swipes
            .read()
            .await
            .get(&(swiper_id, swiped_user_id))
            .copied())
    }

    async fn insert_match_if_absent(&self, candidate: Match) -> Result<MatchInsert, LedgerError> {
        let mut matches = self.matches.write().await;
        let pair = candidate.pair();
        if let Some(existing) = matches.get(&pair) {
            return Ok(MatchInsert::Existing(*existing));
        }
        matches.insert(pair, candidate);
        Ok(MatchInsert::Created(candidate))
    }

    async fn find_match(&self, pair: UserPair) -> Result<Option<Match>, LedgerError> {
        Ok(self.matches.read().await.get(&pair).copied())
    }

    async fn list_matches(
        &self,
        user_id: UserId,
        active_only: bool,
    ) -> Result<Vec<Match>, LedgerError> {
        let matches = self.matches.read().await;
        let mut found: Vec<Match> = matches
            .values()
            .filter(|m| m.pair().contains(user_id))
            .filter(|m| !active_only || m.is_active)
            .copied()
            .collect();
        found.sort_by_key(|m| Reverse(m.matched_at));
        Ok(found)
    }

    async fn deactivate_match(&self, pair: UserPair) -> Result<Option<Match>, LedgerError> {
        let mut matches = self.matches.write().await;
        match matches.get_mut(&pair) {
            Some(m) if m.is_active => {
                m.is_active = false;
                Ok(Some(*m))
            }
            _ => Ok(None),
        }
    }
}
