//! Ledger error types with HTTP status code mapping.
//!
//! [`LedgerError`] is the central error type of the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{GameDomain, InvalidEventError, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid event: outcome_score must be between 0 and 100",
///     "details": ["outcome_score must be between 0 and 100"]
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the ranges on [`LedgerError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Per-field details, present for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Service error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The event violated its domain's invariants. Nothing was mutated.
    #[error(transparent)]
    InvalidEvent(#[from] InvalidEventError),

    /// Request validation failed outside of event ingestion.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Referenced user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No stats row exists yet for the user and domain.
    #[error("no {domain} stats for user {user_id}")]
    StatsNotFound {
        /// Requested user.
        user_id: UserId,
        /// Requested domain.
        domain: GameDomain,
    },

    /// The swiper already swiped on this user.
    #[error("user {swiper_id} already swiped on {swiped_user_id}")]
    DuplicateSwipe {
        /// User who tried to swipe again.
        swiper_id: UserId,
        /// Target of both swipes.
        swiped_user_id: UserId,
    },

    /// No active match between the two users.
    #[error("no active match between {0} and {1}")]
    MatchNotFound(UserId, UserId),

    /// User registration collided with an existing id.
    #[error("user already exists: {0}")]
    UserAlreadyExists(UserId),

    /// Another writer committed the row first; retry the whole operation.
    #[error("concurrent update of {domain} stats for user {user_id}; retry")]
    ConcurrencyConflict {
        /// Owner of the contended row.
        user_id: UserId,
        /// Domain of the contended row.
        domain: GameDomain,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidEvent(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::UserNotFound(_) => 2001,
            Self::StatsNotFound { .. } => 2002,
            Self::MatchNotFound(..) => 2003,
            Self::DuplicateSwipe { .. } => 2101,
            Self::UserAlreadyExists(_) => 2102,
            Self::ConcurrencyConflict { .. } => 2103,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidEvent(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound(_) | Self::StatsNotFound { .. } | Self::MatchNotFound(..) => {
                StatusCode::NOT_FOUND
            }
            Self::DuplicateSwipe { .. }
            | Self::UserAlreadyExists(_)
            | Self::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Per-field details rendered into [`ErrorBody::details`].
    #[must_use]
    pub fn details(&self) -> Option<Vec<String>> {
        match self {
            Self::InvalidEvent(err) => Some(
                err.violations
                    .iter()
                    .map(|v| format!("{} {}", v.field, v.reason))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Returns `true` if the caller should retry the whole operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
