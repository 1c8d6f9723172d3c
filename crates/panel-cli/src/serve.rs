//! # Serve Subcommand
//!
//! Runs the HTTP API. Configuration comes from the environment
//! (`PORT`, `PANEL_AUTH_TOKEN`); `--port` overrides `PORT`.
//!
//! `--registry` swaps the schemas behind the mounted routes, but it does not add
//! routes: only `GET`/`POST /game_roles` are served. Other endpoints the
//! registry declares are listed as warnings at startup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use panel_api::{AppConfig, AppState};

/// Arguments for the `panel serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to bind, overriding `PORT`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Registry document (JSON or YAML). Defaults to the built-in registry.
    /// Only the `game_roles` endpoints are routed.
    #[arg(long)]
    pub registry: Option<PathBuf>,
}

pub fn run_serve(args: &ServeArgs) -> Result<u8> {
    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    let registry = crate::load_registry(args.registry.as_deref())?;
    let state = AppState::try_with_registry(config, registry)
        .context("failed to compile request validators")?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(panel_api::serve(state)).context("server error")?;
    Ok(0)
}
