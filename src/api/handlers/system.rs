//! System endpoints: health check and achievement catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::AchievementInfo;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /config/achievements`: List the achievement catalog.
#[utoipa::path(
    get,
    path = "/config/achievements",
    tag = "System",
    summary = "List achievements",
    description = "Returns every achievement in evaluation order. Entries without a domain can be earned in any domain.",
    responses(
        (status = 200, description = "Achievement catalog", body = Vec<AchievementInfo>),
    )
)]
pub async fn achievements_handler(State(state): State<AppState>) -> impl IntoResponse {
    let catalog: Vec<AchievementInfo> = state
        .ledger_service
        .catalog()
        .iter()
        .map(AchievementInfo::from)
        .collect();
    (StatusCode::OK, Json(catalog))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/achievements", get(achievements_handler))
}
