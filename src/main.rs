// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use landing_api::{
    api::router,
    config::{Config, ConfigError, LogFormat, DEFAULT_LOG_FILTER},
    state::{AppState, StateError},
    store::InMemoryLandingStore,
    transplant::HttpTransplantClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("failed to build transplant client: {0}")]
    TransplantClient(#[from] reqwest::Error),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    init_tracing(config.log_format);

    let addr = config.bind_addr()?;
    let transplant = HttpTransplantClient::from_config(&config)?;
    let state = AppState::new(
        config,
        Arc::new(InMemoryLandingStore::new()),
        Arc::new(transplant),
    )?;
    if !state.pingback.is_enabled() {
        tracing::warn!("Transplant pingbacks are disabled; landings will not be updated");
    }

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Landing API listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
