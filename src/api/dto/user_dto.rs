//! User registration DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{UserId, UserProfile};

/// Request body for `POST /users`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    /// Name shown on leaderboards and matches.
    pub display_name: String,
    /// Id allocated by an upstream identity service. A fresh id is generated
    /// when omitted.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// A registered player.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// Player identifier.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_id: profile.user_id,
            display_name: profile.display_name,
            created_at: profile.created_at,
        }
    }
}
