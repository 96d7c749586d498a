//! Minimal user record used for referential checks.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::UserId;

/// A registered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    /// Player identifier.
    pub user_id: UserId,
    /// Name shown on leaderboards and matches.
    pub display_name: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Creates a profile with a fresh id.
    #[must_use]
    pub fn new(display_name: &str) -> Self {
        Self::with_id(UserId::new(), display_name)
    }

    /// Creates a profile for an id allocated elsewhere.
    #[must_use]
    pub fn with_id(user_id: UserId, display_name: &str) -> Self {
        Self {
            user_id,
            display_name: display_name.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}
