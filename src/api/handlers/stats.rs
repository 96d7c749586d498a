//! Stats and leaderboard read handlers.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{
    LeaderboardEntryDto, LeaderboardResponse, PaginationParams, StatsResponse, UserStatsResponse,
};
use crate::app_state::AppState;
use crate::domain::{GameDomain, UserId};
use crate::error::{ErrorResponse, LedgerError};

fn parse_domain(raw: &str) -> Result<GameDomain, LedgerError> {
    raw.parse().map_err(LedgerError::InvalidRequest)
}

/// `GET /users/{user_id}/stats`: All stats rows of a player.
///
/// # Errors
///
/// Returns [`LedgerError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/stats",
    tag = "Stats",
    summary = "Get all stats of a player",
    params(
        ("user_id" = Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "One entry per domain played", body = UserStatsResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let user_id = UserId::from_uuid(user_id);
    let rows = state.ledger_service.user_stats(user_id).await?;
    Ok(Json(UserStatsResponse {
        user_id,
        domains: rows.into_iter().map(StatsResponse::from).collect(),
    }))
}

/// `GET /users/{user_id}/stats/{domain}`: One stats row.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidRequest`] for an unknown domain,
/// [`LedgerError::UserNotFound`] or [`LedgerError::StatsNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/stats/{domain}",
    tag = "Stats",
    summary = "Get domain stats of a player",
    description = "Returns the current aggregate, computed averages and the last unlock delta.",
    params(
        ("user_id" = Uuid, Path, description = "User UUID"),
        ("domain" = GameDomain, Path, description = "Game domain"),
    ),
    responses(
        (status = 200, description = "Stats snapshot", body = StatsResponse),
        (status = 400, description = "Unknown domain", body = ErrorResponse),
        (status = 404, description = "User or stats not found", body = ErrorResponse),
    )
)]
pub async fn get_domain_stats(
    State(state): State<AppState>,
    Path((user_id, domain)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, LedgerError> {
    let domain = parse_domain(&domain)?;
    let stats = state
        .ledger_service
        .stats(UserId::from_uuid(user_id), domain)
        .await?;
    Ok(Json(StatsResponse::from(stats)))
}

/// `GET /leaderboards/{domain}`: Top players of a domain.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidRequest`] for an unknown domain.
#[utoipa::path(
    get,
    path = "/api/v1/leaderboards/{domain}",
    tag = "Stats",
    summary = "Domain leaderboard",
    description = "Ranks players by score sum; ties go to the player with more games, then the smaller user id.",
    params(
        ("domain" = GameDomain, Path, description = "Game domain"),
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Leaderboard page", body = LeaderboardResponse),
        (status = 400, description = "Unknown domain", body = ErrorResponse),
    )
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, LedgerError> {
    let domain = parse_domain(&domain)?;
    let params = params.clamped();
    let board = state
        .ledger_service
        .leaderboard(domain, params.offset(), params.limit())
        .await?;
    Ok(Json(LeaderboardResponse {
        domain,
        data: board
            .entries
            .into_iter()
            .map(LeaderboardEntryDto::from)
            .collect(),
        pagination: params.meta(board.total),
    }))
}

/// Stats routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/stats", get(get_user_stats))
        .route("/users/{user_id}/stats/{domain}", get(get_domain_stats))
        .route("/leaderboards/{domain}", get(get_leaderboard))
}
