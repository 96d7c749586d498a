//! Swipe and match DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{Match, MatchId, SwipeOutcome, UserId};

/// Request body for `POST /swipes`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwipeRequest {
    /// User who swipes.
    pub swiper_id: UserId,
    /// User being swiped on.
    pub swiped_user_id: UserId,
    /// `true` for a like, `false` for a pass.
    pub is_like: bool,
}

/// A mutual match.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchDto {
    /// Match identifier.
    pub match_id: MatchId,
    /// Smaller user id of the pair.
    pub user1_id: UserId,
    /// Larger user id of the pair.
    pub user2_id: UserId,
    /// Creation timestamp.
    pub matched_at: DateTime<Utc>,
    /// `false` once either user unmatched.
    pub is_active: bool,
}

impl From<Match> for MatchDto {
    fn from(m: Match) -> Self {
        Self {
            match_id: m.match_id,
            user1_id: m.user1_id,
            user2_id: m.user2_id,
            matched_at: m.matched_at,
            is_active: m.is_active,
        }
    }
}

/// Response body for `POST /swipes`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwipeResponse {
    /// `true` if both users like each other.
    pub matched: bool,
    /// The match, when `matched` is `true`.
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_info: Option<MatchDto>,
}

impl From<SwipeOutcome> for SwipeResponse {
    fn from(outcome: SwipeOutcome) -> Self {
        match outcome {
            SwipeOutcome::Matched(m) => Self {
                matched: true,
                match_info: Some(MatchDto::from(m)),
            },
            SwipeOutcome::NoMatch => Self {
                matched: false,
                match_info: None,
            },
        }
    }
}

/// Paginated response for `GET /users/{user_id}/matches`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchListResponse {
    /// Active matches, newest first.
    pub data: Vec<MatchDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
