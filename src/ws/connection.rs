//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::api::dto::StatsResponse;
use crate::domain::{LedgerEvent, UserId};
use crate::error::LedgerError;
use crate::service::LedgerService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<LedgerEvent>,
    ledger_service: Arc<LedgerService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();
    tracing::debug!("ws connection opened");

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &ledger_service).await;
                        if let Some(json) = reply
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(ledger_event) => {
                        if !subs.matches(&ledger_event) {
                            continue;
                        }
                        let Ok(payload) = serde_json::to_value(&ledger_event) else {
                            continue;
                        };
                        let msg = WsMessage::new(
                            uuid::Uuid::new_v4().to_string(),
                            WsMessageType::Event,
                            payload,
                        );
                        let Ok(json) = serde_json::to_string(&msg) else {
                            continue;
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    ledger_service: &LedgerService,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error(String::new(), 400, "malformed JSON")).ok();
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let reply = match command {
        WsCommand::Subscribe { user_ids } => {
            let wildcard = user_ids.iter().any(|s| s == "*");
            let ids = parse_user_ids(&user_ids);
            subs.subscribe(&ids, wildcard);
            tracing::debug!(count = subs.count(), wildcard, "ws subscribe");
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { user_ids } => {
            let ids = parse_user_ids(&user_ids);
            subs.unsubscribe(&ids);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                }),
            )
        }
        WsCommand::GetStats { user_id, domain } => {
            let Ok(uuid) = user_id.parse::<uuid::Uuid>() else {
                return serde_json::to_string(&WsMessage::error(msg.id, 400, "invalid user_id"))
                    .ok();
            };
            let user_id = UserId::from_uuid(uuid);
            let result = match domain {
                Some(domain) => ledger_service
                    .stats(user_id, domain)
                    .await
                    .map(|s| vec![StatsResponse::from(s)]),
                None => ledger_service
                    .user_stats(user_id)
                    .await
                    .map(|rows| rows.into_iter().map(StatsResponse::from).collect()),
            };
            match result.and_then(|stats| {
                serde_json::to_value(stats).map_err(|e| LedgerError::Internal(e.to_string()))
            }) {
                Ok(payload) => WsMessage::new(msg.id, WsMessageType::Response, payload),
                Err(err) => WsMessage::error(msg.id, err.error_code(), &err.to_string()),
            }
        }
    };
    serde_json::to_string(&reply).ok()
}

fn parse_user_ids(raw: &[String]) -> Vec<UserId> {
    raw.iter()
        .filter_map(|s| s.parse::<uuid::Uuid>().ok())
        .map(UserId::from_uuid)
        .collect()
}
