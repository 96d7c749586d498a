//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::GameDomain;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: String, code: u32, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket, carried in
/// [`WsMessage::payload`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to notifications involving specific users.
    Subscribe {
        /// User IDs to follow. Use `["*"]` for every user.
        user_ids: Vec<String>,
    },
    /// Stop following specific users.
    Unsubscribe {
        /// User IDs to drop.
        user_ids: Vec<String>,
    },
    /// Fetch current stats of a user.
    GetStats {
        /// Target user ID.
        user_id: String,
        /// Restrict to one domain; all domains when omitted.
        #[serde(default)]
        domain: Option<GameDomain>,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_subscribe_envelope() {
        let raw = r#"{"id":"1","type":"command","payload":{"command":"subscribe","user_ids":["*"]}}"#;
        let Ok(msg) = serde_json::from_str::<WsMessage>(raw) else {
            panic!("envelope should parse");
        };
        assert_eq!(msg.msg_type, WsMessageType::Command);
        let Ok(cmd) = serde_json::from_value::<WsCommand>(msg.payload) else {
            panic!("command should parse");
        };
        assert_eq!(
            cmd,
            WsCommand::Subscribe {
                user_ids: vec!["*".to_string()]
            }
        );
    }

    #[test]
    fn parses_get_stats_with_domain() {
        let raw = serde_json::json!({
            "command": "get_stats",
            "user_id": "00000000-0000-0000-0000-000000000001",
            "domain": "bug_chase"
        });
        let Ok(WsCommand::GetStats { domain, .. }) = serde_json::from_value::<WsCommand>(raw) else {
            panic!("get_stats should parse");
        };
        assert_eq!(domain, Some(GameDomain::BugChase));
    }
}
