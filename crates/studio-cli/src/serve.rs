//! # Serve Subcommand
//!
//! Startup is sequential: discover the router, build the catalog, build
//! the relay client with the router's transformer, bind, serve. Any
//! failure before the listener is bound aborts startup.

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use studio_api::state::AppState;
use studio_relay::{ExecutionRelay, HttpRpcClient, HttpRpcConfig};

use crate::config::StudioConfig;
use crate::discover_router;

/// Execute the serve subcommand. Returns once the server has shut down.
pub async fn run_serve(config: &StudioConfig) -> Result<u8> {
    let discovered = discover_router(&config.router_path).await?;
    tracing::info!(
        router = %discovered.router.name,
        procedures = discovered.catalog.len(),
        transformer = %discovered.router.transformer,
        "router discovered"
    );

    let client_config = HttpRpcConfig::new(config.trpc_endpoint.clone())
        .with_transformer(discovered.router.transformer)
        .with_timeout(config.request_timeout);
    let client = HttpRpcClient::new(client_config).context("failed to build the tRPC client")?;
    let state = AppState::new(discovered.catalog, ExecutionRelay::new(client));

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    tracing::info!(endpoint = %config.trpc_endpoint, "relaying executions");

    studio_api::serve(listener, state, shutdown_signal())
        .await
        .context("server error")?;
    tracing::info!("studio stopped");
    Ok(0)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
