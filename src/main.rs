//! arcade-ledger server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use arcade_ledger::api;
use arcade_ledger::app_state::AppState;
use arcade_ledger::config::{LedgerConfig, LogFormat};
use arcade_ledger::persistence::{PostgresStore, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = LedgerConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting arcade-ledger");

    let stores = if config.persistence_enabled {
        let store = PostgresStore::connect(&config)
            .await
            .context("connecting to PostgreSQL")?;
        if config.run_migrations {
            store.migrate().await.context("running migrations")?;
            tracing::info!("database migrations applied");
        }
        Stores::postgres(store)
    } else {
        tracing::warn!("persistence disabled, using in-memory store");
        Stores::in_memory()
    };

    let app_state = AppState::new(stores, &config);
    let app = api::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
