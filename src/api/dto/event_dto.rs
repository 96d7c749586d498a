//! Game event ingestion DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::stats_dto::StatsResponse;
use crate::domain::{EventPayload, GameDomain, GameEvent, UserId};
use crate::service::EventOutcome;

/// Request body for `POST /events`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordEventRequest {
    /// Player the event belongs to.
    pub user_id: UserId,
    /// Minigame that produced the event.
    pub domain: GameDomain,
    /// Outcome score; the valid range depends on the domain.
    pub outcome_score: i64,
    /// When the action resolved. Defaults to the time of receipt.
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    /// Time spent on the action.
    #[serde(default)]
    pub duration_secs: Option<i64>,
    /// Domain-specific data, tagged by `kind`.
    pub payload: EventPayload,
}

impl From<RecordEventRequest> for GameEvent {
    fn from(req: RecordEventRequest) -> Self {
        Self {
            user_id: req.user_id,
            domain: req.domain,
            outcome_score: req.outcome_score,
            occurred_at: req.occurred_at.unwrap_or_else(Utc::now),
            duration_secs: req.duration_secs,
            payload: req.payload,
        }
    }
}

/// Response body for `POST /events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordEventResponse {
    /// Stats row after the event.
    pub stats: StatsResponse,
    /// Achievements unlocked by this event, in catalog order.
    pub newly_unlocked: Vec<String>,
}

impl From<EventOutcome> for RecordEventResponse {
    fn from(outcome: EventOutcome) -> Self {
        Self {
            stats: StatsResponse::from(outcome.stats),
            newly_unlocked: outcome.newly_unlocked,
        }
    }
}
