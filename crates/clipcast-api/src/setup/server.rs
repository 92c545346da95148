//! HTTP server startup and graceful shutdown.

use anyhow::Result;
use axum::Router;
use clipcast_core::Config;

pub async fn start_server(config: &Config, router: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        "clipcast API listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown signal handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}
