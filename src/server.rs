//! HTTP server startup: pick the store, build shared state, serve until ctrl-c.

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::data::DataAccess;
use crate::routes::{self, AppState};
use crate::store;

/// Shared setup: select the storage backend and wire up handlers' state.
pub fn build_state(config: AppConfig) -> Result<AppState> {
    config.warn_missing();

    let store = store::create_store(&config)?;
    tracing::info!(backend = %store.backend, "store ready");

    let state = AppState::new(config, DataAccess::new(store))?;
    if state.gate.is_placeholder() {
        tracing::warn!("remote store not configured - every request is the placeholder user");
    }
    tracing::info!(
        llm = state.advisor.uses_llm(),
        signup = state.auth.is_some(),
        "integrations ready"
    );
    Ok(state)
}

/// Start the API server and block until shutdown.
pub async fn serve(config: AppConfig) -> Result<()> {
    let bind_addr = config.bind_addr();
    tracing::info!(addr = %bind_addr, debug = config.server.debug, "starting EmotiTask API");

    let state = build_state(config)?;
    let router = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "EmotiTask API listening at http://{bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down API server");
        })
        .await?;

    Ok(())
}
