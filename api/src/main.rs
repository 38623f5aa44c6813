//! Storefront auth HTTP service
//!
//! Serves signup, login, two-factor verification and passkey availability
//! over a small REST API built on Axum. All state is in memory.

use anyhow::Error;
use auth::{ServiceConfig, spawn_challenge_sweeper};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod context;
mod errors;
mod extract;
mod routes;
mod validation;

#[cfg(test)]
mod integration_tests;

use context::AppState;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    // Initialize tracing for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Starting storefront auth service");

    let service_config =
        ServiceConfig::from_env().map_err(|e| anyhow::anyhow!("Failed to load service configuration: {e}"))?;

    let state = AppState::from_config(&service_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize application state: {e}"))?;

    if let Some(interval) = service_config.sweep_interval() {
        spawn_challenge_sweeper(state.auth.clone(), interval);
    }

    let app = routes::create_app(state);
    let listener = TcpListener::bind(service_config.bind_address).await?;
    info!(
        address = %service_config.bind_address,
        environment = %service_config.environment,
        "Listening"
    );
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
