//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::LedgerConfig;
use crate::domain::{AchievementCatalog, EventBus};
use crate::persistence::Stores;
use crate::service::{LedgerService, MatchService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event pipeline and stats reads.
    pub ledger_service: Arc<LedgerService>,
    /// Swipes and matches.
    pub match_service: Arc<MatchService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires both services onto `stores` with one shared event bus and the
    /// standard achievement catalog.
    #[must_use]
    pub fn new(stores: Stores, config: &LedgerConfig) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let ledger_service = Arc::new(LedgerService::new(
            Arc::clone(&stores.users),
            stores.stats,
            Arc::new(AchievementCatalog::standard()),
            config.thresholds,
            event_bus.clone(),
        ));
        let match_service = Arc::new(MatchService::new(
            stores.users,
            stores.swipes,
            event_bus.clone(),
        ));
        Self {
            ledger_service,
            match_service,
            event_bus,
        }
    }
}
