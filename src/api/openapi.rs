//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::handlers;

/// Generated OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "arcade-ledger",
        description = "Gamification ledger and mutual-match engine for developer-culture minigames."
    ),
    paths(
        handlers::users::register_user,
        handlers::users::get_user,
        handlers::events::record_event,
        handlers::stats::get_user_stats,
        handlers::stats::get_domain_stats,
        handlers::stats::get_leaderboard,
        handlers::matches::record_swipe,
        handlers::matches::list_matches,
        handlers::matches::unmatch,
        handlers::system::health_handler,
        handlers::system::achievements_handler,
    ),
    tags(
        (name = "Users", description = "Player registration"),
        (name = "Events", description = "Game event ingestion"),
        (name = "Stats", description = "Aggregates and leaderboards"),
        (name = "Matches", description = "Swipes and mutual matches"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;
