//! Swipes, canonical user pairs and matches.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{MatchId, UserId};

/// A single like/pass decision. Immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwipeAction {
    /// User who swiped.
    pub swiper_id: UserId,
    /// User who was swiped on.
    pub swiped_user_id: UserId,
    /// `true` for a like, `false` for a pass.
    pub is_like: bool,
    /// When the swipe happened.
    pub swiped_at: DateTime<Utc>,
}

impl SwipeAction {
    /// Creates a swipe stamped with the current time.
    #[must_use]
    pub fn new(swiper_id: UserId, swiped_user_id: UserId, is_like: bool) -> Self {
        Self {
            swiper_id,
            swiped_user_id,
            is_like,
            swiped_at: Utc::now(),
        }
    }
}

/// Unordered pair of distinct users, stored with the smaller id first so a
/// uniqueness constraint on `(low, high)` is independent of swipe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserPair {
    low: UserId,
    high: UserId,
}

impl UserPair {
    /// Canonicalizes `(a, b)`. Returns `None` when `a == b`.
    #[must_use]
    pub fn new(a: UserId, b: UserId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Smaller user id.
    #[must_use]
    pub const fn user1(&self) -> UserId {
        self.low
    }

    /// Larger user id.
    #[must_use]
    pub const fn user2(&self) -> UserId {
        self.high
    }

    /// Returns `true` if `user` is one of the two members.
    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }

    /// Returns the member that is not `user`, if `user` is a member.
    #[must_use]
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if user == self.low {
            Some(self.high)
        } else if user == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

/// Mutual like between two users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Match identifier.
    pub match_id: MatchId,
    /// Smaller user id of the pair.
    pub user1_id: UserId,
    /// Larger user id of the pair.
    pub user2_id: UserId,
    /// When the second like landed.
    pub matched_at: DateTime<Utc>,
    /// `false` once either user unmatched.
    pub is_active: bool,
}

impl Match {
    /// Creates an active match for `pair`.
    #[must_use]
    pub fn new(pair: UserPair, matched_at: DateTime<Utc>) -> Self {
        Self {
            match_id: MatchId::new(),
            user1_id: pair.user1(),
            user2_id: pair.user2(),
            matched_at,
            is_active: true,
        }
    }

    /// Canonical pair of the match.
    #[must_use]
    pub const fn pair(&self) -> UserPair {
        UserPair {
            low: self.user1_id,
            high: self.user2_id,
        }
    }
}

/// Result of an insert-if-absent on the match store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchInsert {
    /// This call created the match.
    Created(Match),
    /// The pair was already matched; the existing row is returned.
    Existing(Match),
}

impl MatchInsert {
    /// The match row, regardless of who created it.
    #[must_use]
    pub const fn into_match(self) -> Match {
        match self {
            Self::Created(m) | Self::Existing(m) => m,
        }
    }
}

/// Result of recording a swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// Both users like each other; carries the (possibly pre-existing) match.
    Matched(Match),
    /// A pass, or a like that is not reciprocated yet.
    NoMatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (UserId, UserId) {
        (
            UserId::from_uuid(uuid::Uuid::from_u128(7)),
            UserId::from_uuid(uuid::Uuid::from_u128(3)),
        )
    }

    #[test]
    fn pair_is_order_independent() {
        let (a, b) = ids();
        assert_eq!(UserPair::new(a, b), UserPair::new(b, a));
        let pair = UserPair::new(a, b);
        assert_eq!(pair.map(|p| p.user1()), Some(b));
        assert_eq!(pair.map(|p| p.user2()), Some(a));
    }

    #[test]
    fn self_pair_is_rejected() {
        let (a, _) = ids();
        assert!(UserPair::new(a, a).is_none());
    }

    #[test]
    fn other_member() {
        let (a, b) = ids();
        let pair = UserPair::new(a, b);
        assert_eq!(pair.and_then(|p| p.other(a)), Some(b));
        assert_eq!(pair.and_then(|p| p.other(UserId::new())), None);
    }

    #[test]
    fn match_stores_canonical_order() {
        let (a, b) = ids();
        let Some(pair) = UserPair::new(a, b) else {
            return;
        };
        let m = Match::new(pair, Utc::now());
        assert!(m.user1_id < m.user2_id);
        assert_eq!(m.pair(), pair);
        assert!(m.is_active);
    }
}
