//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` forwards ledger notifications for the
//! users a client follows and answers stats queries.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
