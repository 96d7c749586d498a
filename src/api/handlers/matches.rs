//! Swipe and match handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{MatchDto, MatchListResponse, PaginationParams, SwipeRequest, SwipeResponse};
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /swipes`: Like or pass on a user.
///
/// # Errors
///
/// Returns [`LedgerError::DuplicateSwipe`] if the swiper already swiped on
/// this user, [`LedgerError::UserNotFound`] or
/// [`LedgerError::InvalidRequest`] for a self-swipe.
#[utoipa::path(
    post,
    path = "/api/v1/swipes",
    tag = "Matches",
    summary = "Record a swipe",
    description = "Stores a like or pass. A like on a user who already liked back returns the mutual match.",
    request_body = SwipeRequest,
    responses(
        (status = 200, description = "Swipe recorded", body = SwipeResponse),
        (status = 400, description = "Self-swipe", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Duplicate swipe", body = ErrorResponse),
    )
)]
pub async fn record_swipe(
    State(state): State<AppState>,
    Json(req): Json<SwipeRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let outcome = state
        .match_service
        .record_swipe_detached(req.swiper_id, req.swiped_user_id, req.is_like)
        .await?;
    Ok(Json(SwipeResponse::from(outcome)))
}

/// `GET /users/{user_id}/matches`: Active matches of a player.
///
/// # Errors
///
/// Returns [`LedgerError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/matches",
    tag = "Matches",
    summary = "List active matches",
    params(
        ("user_id" = Uuid, Path, description = "User UUID"),
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Active matches, newest first", body = MatchListResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_matches(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, LedgerError> {
    let params = params.clamped();
    let matches = state
        .match_service
        .list_matches(UserId::from_uuid(user_id))
        .await?;

    let total = matches.len() as u64;
    let data = matches
        .into_iter()
        .skip(params.offset())
        .take(params.limit())
        .map(MatchDto::from)
        .collect();

    Ok(Json(MatchListResponse {
        data,
        pagination: params.meta(total),
    }))
}

/// `DELETE /users/{user_id}/matches/{other_id}`: Unmatch.
///
/// # Errors
///
/// Returns [`LedgerError::MatchNotFound`] if the pair has no active match.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/matches/{other_id}",
    tag = "Matches",
    summary = "Unmatch",
    description = "Deactivates the match between the two users. The match row is kept.",
    params(
        ("user_id" = Uuid, Path, description = "User ending the match"),
        ("other_id" = Uuid, Path, description = "Other party of the match"),
    ),
    responses(
        (status = 204, description = "Match ended"),
        (status = 404, description = "No active match", body = ErrorResponse),
    )
)]
pub async fn unmatch(
    State(state): State<AppState>,
    Path((user_id, other_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, LedgerError> {
    state
        .match_service
        .unmatch(UserId::from_uuid(user_id), UserId::from_uuid(other_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Swipe and match routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/swipes", post(record_swipe))
        .route("/users/{user_id}/matches", get(list_matches))
        .route("/users/{user_id}/matches/{other_id}", delete(unmatch))
}
