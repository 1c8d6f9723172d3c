//! # Definitions Subcommand
//!
//! Lists the named schemas and the endpoint tables of a registry.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use panel_schema::Registry;

/// Arguments for the `panel definitions` subcommand.
#[derive(Args, Debug)]
pub struct DefinitionsArgs {
    /// Registry document (JSON or YAML). Defaults to the built-in registry.
    #[arg(long)]
    pub registry: Option<PathBuf>,
}

pub fn run_definitions(args: &DefinitionsArgs) -> Result<u8> {
    let registry = crate::load_registry(args.registry.as_deref())?;
    print!("{}", render(&registry));
    Ok(0)
}

/// Human-readable listing of `registry`.
pub fn render(registry: &Registry) -> String {
    let mut out = String::new();

    let names = registry.definition_names();
    let _ = writeln!(out, "Definitions ({}):", names.len());
    for name in names {
        let kind = registry
            .definition(name)
            .map(|s| s.kind().to_string())
            .unwrap_or_default();
        let _ = writeln!(out, "  {name}: {kind}");
    }

    let endpoints = registry.endpoints();
    let _ = writeln!(out, "Endpoints ({}):", endpoints.len());
    for key in endpoints {
        let locations: Vec<&str> = registry
            .validator(&key.endpoint, &key.method)
            .map(|v| {
                [
                    ("headers", v.headers.is_some()),
                    ("args", v.args.is_some()),
                    ("json", v.json.is_some()),
                ]
                .into_iter()
                .filter_map(|(name, present)| present.then_some(name))
                .collect()
            })
            .unwrap_or_default();
        let scopes = registry.scopes(&key.endpoint, &key.method);
        let _ = writeln!(
            out,
            "  {key}  validates=[{}]  scopes=[{}]",
            locations.join(", "),
            scopes.join(", ")
        );
    }

    out
}
