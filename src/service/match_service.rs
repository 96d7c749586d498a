//! Match service: swipes, mutual matches and unmatching.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{EventBus, Match, MatchInsert, SwipeAction, SwipeOutcome, UserId, UserPair};
use crate::error::LedgerError;
use crate::persistence::{SwipeRepository, UserDirectory};

/// Orchestration layer for the mutual-match engine.
///
/// Correctness under concurrency rests on two conditional inserts at the
/// storage layer: one per ordered swipe pair and one per canonical match
/// pair. No read-then-write decides whether a match exists.
#[derive(Debug)]
pub struct MatchService {
    users: Arc<dyn UserDirectory>,
    swipes: Arc<dyn SwipeRepository>,
    event_bus: EventBus,
}

impl MatchService {
    /// Creates a new `MatchService`.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserDirectory>,
        swipes: Arc<dyn SwipeRepository>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            users,
            swipes,
            event_bus,
        }
    }

    /// Records a like or a pass of `swiper_id` on `swiped_user_id`.
    ///
    /// A like on a user who already liked back yields
    /// [`SwipeOutcome::Matched`]. When both likes race, both callers see the
    /// same match but only the one that created it publishes
    /// `match_created`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for a self-swipe,
    /// [`LedgerError::UserNotFound`] if either user is unknown, or
    /// [`LedgerError::DuplicateSwipe`] if the swiper already swiped on this
    /// user (the stored swipe is left untouched).
    pub async fn record_swipe(
        &self,
        swiper_id: UserId,
        swiped_user_id: UserId,
        is_like: bool,
    ) -> Result<SwipeOutcome, LedgerError> {
        let pair = UserPair::new(swiper_id, swiped_user_id)
            .ok_or_else(|| LedgerError::InvalidRequest("cannot swipe on yourself".to_string()))?;
        for user_id in [swiper_id, swiped_user_id] {
            if !self.users.exists(user_id).await? {
                return Err(LedgerError::UserNotFound(user_id));
            }
        }

        let swipe = SwipeAction::new(swiper_id, swiped_user_id, is_like);
        if !self.swipes.insert_swipe(&swipe).await? {
            tracing::warn!(%swiper_id, %swiped_user_id, "duplicate swipe rejected");
            return Err(LedgerError::DuplicateSwipe {
                swiper_id,
                swiped_user_id,
            });
        }
        tracing::debug!(%swiper_id, %swiped_user_id, is_like, "swipe recorded");

        if !is_like {
            return Ok(SwipeOutcome::NoMatch);
        }

        let reciprocal = self.swipes.find_swipe(swiped_user_id, swiper_id).await?;
        if !reciprocal.is_some_and(|s| s.is_like) {
            return Ok(SwipeOutcome::NoMatch);
        }

        let inserted = self
            .swipes
            .insert_match_if_absent(Match::new(pair, Utc::now()))
            .await?;
        if let MatchInsert::Created(created) = &inserted {
            tracing::info!(
                match_id = %created.match_id,
                user1_id = %created.user1_id,
                user2_id = %created.user2_id,
                "match created"
            );
            self.event_bus.publish_match_created(created);
        }
        Ok(SwipeOutcome::Matched(inserted.into_match()))
    }

    /// Runs [`record_swipe`](Self::record_swipe) on its own task. A caller
    /// that gives up early cannot leave a stored swipe without its match.
    ///
    /// # Errors
    ///
    /// See [`record_swipe`](Self::record_swipe). A panicked task maps to
    /// [`LedgerError::Internal`].
    pub async fn record_swipe_detached(
        self: &Arc<Self>,
        swiper_id: UserId,
        swiped_user_id: UserId,
        is_like: bool,
    ) -> Result<SwipeOutcome, LedgerError> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            service
                .record_swipe(swiper_id, swiped_user_id, is_like)
                .await
        })
        .await
        .map_err(|e| LedgerError::Internal(format!("swipe task failed: {e}")))?
    }

    /// Active matches of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] for an unknown user.
    pub async fn list_matches(&self, user_id: UserId) -> Result<Vec<Match>, LedgerError> {
        if !self.users.exists(user_id).await? {
            return Err(LedgerError::UserNotFound(user_id));
        }
        self.swipes.list_matches(user_id, true).await
    }

    /// Ends the active match between `user_id` and `other_id`. The match
    /// row is kept with `is_active = false`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] if both ids are equal, or
    /// [`LedgerError::MatchNotFound`] if the pair has no active match.
    pub async fn unmatch(&self, user_id: UserId, other_id: UserId) -> Result<Match, LedgerError> {
        let pair = UserPair::new(user_id, other_id)
            .ok_or_else(|| LedgerError::InvalidRequest("cannot unmatch yourself".to_string()))?;
        let ended = self
            .swipes
            .deactivate_match(pair)
            .await?
            .ok_or(LedgerError::MatchNotFound(user_id, other_id))?;

        tracing::info!(match_id = %ended.match_id, ended_by = %user_id, "match ended");
        self.event_bus.publish_match_ended(&ended, user_id);
        Ok(ended)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{LedgerEvent, UserProfile};
    use crate::persistence::MemoryStore;

    async fn setup() -> (MatchService, UserId, UserId) {
        let store = Arc::new(MemoryStore::new());
        let a = UserProfile::new("alice");
        let b = UserProfile::new("bob");
        for user in [&a, &b] {
            let Ok(()) = store.register(user).await else {
                panic!("registration failed");
            };
        }
        let service = MatchService::new(
            Arc::clone(&store) as Arc<dyn UserDirectory>,
            store,
            EventBus::new(64),
        );
        (service, a.user_id, b.user_id)
    }

    #[tokio::test]
    async fn mutual_like_creates_one_match() {
        let (service, a, b) = setup().await;
        let mut rx = service.event_bus.subscribe();

        assert!(matches!(
            service.record_swipe(a, b, true).await,
            Ok(SwipeOutcome::NoMatch)
        ));
        let Ok(SwipeOutcome::Matched(m)) = service.record_swipe(b, a, true).await else {
            panic!("expected a match");
        };
        assert!(m.is_active);
        assert!(m.user1_id < m.user2_id);

        let Ok(LedgerEvent::MatchCreated { match_id, .. }) = rx.try_recv() else {
            panic!("expected match_created");
        };
        assert_eq!(match_id, m.match_id);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn pass_never_matches() {
        let (service, a, b) = setup().await;
        let _ = service.record_swipe(a, b, false).await;
        assert!(matches!(
            service.record_swipe(b, a, true).await,
            Ok(SwipeOutcome::NoMatch)
        ));
    }

    #[tokio::test]
    async fn duplicate_swipe_is_rejected_and_keeps_original() {
        let (service, a, b) = setup().await;
        let _ = service.record_swipe(a, b, true).await;
        let second = service.record_swipe(a, b, false).await;
        assert!(matches!(second, Err(LedgerError::DuplicateSwipe { .. })));

        let Ok(Some(stored)) = service.swipes.find_swipe(a, b).await else {
            panic!("swipe missing");
        };
        assert!(stored.is_like);
    }

    #[tokio::test]
    async fn self_swipe_and_unknown_users_are_rejected() {
        let (service, a, _) = setup().await;
        assert!(matches!(
            service.record_swipe(a, a, true).await,
            Err(LedgerError::InvalidRequest(_))
        ));
        assert!(matches!(
            service.record_swipe(a, UserId::new(), true).await,
            Err(LedgerError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_mutual_likes_create_exactly_one_match() {
        for _ in 0..25 {
            let (service, a, b) = setup().await;
            let service = Arc::new(service);
            let mut rx = service.event_bus.subscribe();

            let s1 = Arc::clone(&service);
            let s2 = Arc::clone(&service);
            let (r1, r2) = tokio::join!(
                tokio::spawn(async move { s1.record_swipe(a, b, true).await }),
                tokio::spawn(async move { s2.record_swipe(b, a, true).await }),
            );
            let (Ok(Ok(o1)), Ok(Ok(o2))) = (r1, r2) else {
                panic!("swipe failed");
            };

            let ids: Vec<_> = [o1, o2]
                .into_iter()
                .filter_map(|o| match o {
                    SwipeOutcome::Matched(m) => Some(m.match_id),
                    SwipeOutcome::NoMatch => None,
                })
                .collect();
            assert!(!ids.is_empty());
            assert!(ids.windows(2).all(|w| w.first() == w.last()));

            let Ok(matches) = service.list_matches(a).await else {
                panic!("list failed");
            };
            assert_eq!(matches.len(), 1);

            let mut created = 0;
            while let Ok(event) = rx.try_recv() {
                if matches!(event, LedgerEvent::MatchCreated { .. }) {
                    created += 1;
                }
            }
            assert_eq!(created, 1);
        }
    }

    #[tokio::test]
    async fn detached_swipe_commits_after_caller_gives_up() {
        let (service, a, b) = setup().await;
        let service = Arc::new(service);
        let _ = service.record_swipe(a, b, true).await;

        let mut rx = service.event_bus.subscribe();
        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(0),
            service.record_swipe_detached(b, a, true),
        )
        .await;
        drop(abandoned);

        let created = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv()).await;
        assert!(matches!(created, Ok(Ok(LedgerEvent::MatchCreated { .. }))));
        let Ok(matches) = service.list_matches(a).await else {
            panic!("list failed");
        };
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn unmatch_deactivates_once() {
        let (service, a, b) = setup().await;
        let _ = service.record_swipe(a, b, true).await;
        let _ = service.record_swipe(b, a, true).await;

        let Ok(ended) = service.unmatch(b, a).await else {
            panic!("unmatch failed");
        };
        assert!(!ended.is_active);
        assert!(matches!(
            service.unmatch(a, b).await,
            Err(LedgerError::MatchNotFound(..))
        ));
        let Ok(active) = service.list_matches(a).await else {
            panic!("list failed");
        };
        assert!(active.is_empty());
    }
}
