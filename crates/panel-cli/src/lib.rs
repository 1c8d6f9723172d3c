//! # panel-cli: CLI Tool for Panel
//!
//! Provides the `panel` command-line interface.
//!
//! ## Subcommands
//!
//! - `panel normalize`: fill defaults into a data file per a named schema.
//! - `panel validate`: normalize, then run the constraint pass.
//! - `panel definitions`: list registry definitions and endpoints.
//! - `panel serve`: run the HTTP API.
//!
//! ```bash
//! panel normalize --schema Createquestion question.json
//! echo '{"content": "x"}' | panel validate --schema Createquestion -
//! panel definitions --registry schemas.yaml
//! ```
//!
//! Every subcommand returns an exit code: 0 on success, 1 when the data
//! is incomplete or invalid. Operational errors surface as `anyhow` errors
//! and exit with 2.

pub mod definitions;
pub mod normalize;
pub mod serve;
pub mod validate;

use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use panel_schema::{read_document, Registry, Schema};
use serde_json::Value;

/// The registry at `path`, or the built-in one.
pub fn load_registry(path: Option<&Path>) -> Result<Registry> {
    match path {
        Some(path) => Registry::from_path(path)
            .with_context(|| format!("failed to load registry from {}", path.display())),
        None => Ok(Registry::builtin().clone()),
    }
}

/// Look up a named definition, listing the known names on failure.
pub fn lookup_schema<'r>(registry: &'r Registry, name: &str) -> Result<&'r Schema> {
    registry.definition(name).ok_or_else(|| {
        anyhow!(
            "unknown schema '{name}' (known: {})",
            registry.definition_names().join(", ")
        )
    })
}

/// Read a data document. `-` reads JSON from stdin; files ending in
/// `.yaml`/`.yml` are YAML, anything else JSON.
pub fn read_data(path: &Path) -> Result<Value> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        return parse_json(&input);
    }
    read_document(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse JSON input. Blank input is `null`.
pub fn parse_json(input: &str) -> Result<Value> {
    if input.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(input).context("input is not valid JSON")
}
