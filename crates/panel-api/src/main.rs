//! # panel-api: Binary Entry Point
//!
//! Starts the Axum HTTP server over the built-in schema registry.
//! Binds to `PORT` (default 8080).

use panel_api::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let state = AppState::try_with_config(config).map_err(|e| {
        tracing::error!("Failed to compile request validators: {e}");
        e
    })?;

    panel_api::serve(state).await?;
    Ok(())
}
