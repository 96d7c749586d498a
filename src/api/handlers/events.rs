//! Game event ingestion handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{RecordEventRequest, RecordEventResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /events`: Record a game event.
///
/// Runs validation, aggregation, streak tracking and achievement evaluation
/// and commits the result in one write.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidEvent`] with every field violation,
/// [`LedgerError::UserNotFound`] for an unknown user, or
/// [`LedgerError::ConcurrencyConflict`] when the caller should retry.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Record a game event",
    description = "Validates a minigame outcome and folds it into the user's stats for that domain. Returns the committed stats and any achievements unlocked by this event.",
    request_body = RecordEventRequest,
    responses(
        (status = 200, description = "Event applied", body = RecordEventResponse),
        (status = 400, description = "Invalid event", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Concurrent update, retry", body = ErrorResponse),
    )
)]
pub async fn record_event(
    State(state): State<AppState>,
    Json(req): Json<RecordEventRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let outcome = state
        .ledger_service
        .record_event_detached(req.into())
        .await?;
    Ok(Json(RecordEventResponse::from(outcome)))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", post(record_event))
}
