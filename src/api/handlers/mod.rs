//! REST endpoint handlers organized by resource.

pub mod events;
pub mod matches;
pub mod stats;
pub mod system;
pub mod users;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(users::routes())
        .merge(events::routes())
        .merge(stats::routes())
        .merge(matches::routes())
}
