//! User registration and lookup handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{RegisterUserRequest, UserResponse};
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /users`: Register a player.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidRequest`] for a blank name or
/// [`LedgerError::UserAlreadyExists`] for a taken id.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    summary = "Register a player",
    description = "Creates the user record that game events and swipes reference. The id is generated unless supplied.",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Blank display name", body = ErrorResponse),
        (status = 409, description = "User id already taken", body = ErrorResponse),
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let profile = state
        .ledger_service
        .register_user(&req.display_name, req.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(profile))))
}

/// `GET /users/{user_id}`: Look up a player.
///
/// # Errors
///
/// Returns [`LedgerError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    summary = "Get a player",
    params(
        ("user_id" = Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "User record", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let profile = state.ledger_service.user(UserId::from_uuid(user_id)).await?;
    Ok(Json(UserResponse::from(profile)))
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/{user_id}", get(get_user))
}
