//! # arcade-ledger
//!
//! Gamification ledger and mutual-match engine for a suite of
//! developer-culture minigames.
//!
//! Minigames submit game events; the ledger validates them, folds them into
//! one stats row per user and domain, tracks success streaks and unlocks
//! achievements. A small match engine turns two independent likes into
//! exactly one match.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── LedgerService / MatchService (service/)
//!     ├── EventBus, KeyedLocks (domain/)
//!     │
//!     ├── validate → aggregate → streak → achievements (domain/)
//!     │
//!     └── Repositories (persistence/): in-memory or PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
