//! # panel CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use panel_cli::definitions::{run_definitions, DefinitionsArgs};
use panel_cli::normalize::{run_normalize, NormalizeArgs};
use panel_cli::serve::{run_serve, ServeArgs};
use panel_cli::validate::{run_validate, ValidateArgs};

/// Panel schema toolchain.
///
/// Normalizes and validates data against the request schemas, inspects
/// the schema registry, and runs the API server.
#[derive(Parser, Debug)]
#[command(name = "panel", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fill defaults into a data document.
    Normalize(NormalizeArgs),

    /// Normalize a data document, then check its constraints.
    Validate(ValidateArgs),

    /// List registry definitions and endpoints.
    Definitions(DefinitionsArgs),

    /// Run the HTTP API.
    Serve(ServeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // `serve` logs at info by default; the offline commands stay quiet.
    let base = u8::from(matches!(cli.command, Commands::Serve(_)));
    let filter = match cli.verbose.saturating_add(base) {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Normalize(args) => run_normalize(&args),
        Commands::Validate(args) => run_validate(&args),
        Commands::Definitions(args) => run_definitions(&args),
        Commands::Serve(args) => run_serve(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
