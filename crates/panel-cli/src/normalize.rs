//! # Normalize Subcommand
//!
//! Fills defaults into a data document according to a registry schema.
//!
//! By default the standard per-type fallback table is used, so required
//! properties always come out filled and only the value is printed. With
//! `--raw` no table is used; the output is `{"value": ..., "errors": [...]}`
//! and the exit code is 1 when any required property is missing.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use panel_schema::{merge_default, normalize, Registry};
use serde_json::Value;

/// Arguments for the `panel normalize` subcommand.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Registry definition to normalize against (e.g. `Createquestion`).
    #[arg(long)]
    pub schema: String,

    /// Registry document (JSON or YAML). Defaults to the built-in registry.
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Skip the type-default table and report missing required properties.
    #[arg(long)]
    pub raw: bool,

    /// Data file, or `-` for JSON on stdin.
    #[arg(value_name = "DATA")]
    pub data: PathBuf,
}

/// Execute the normalize subcommand.
pub fn run_normalize(args: &NormalizeArgs) -> Result<u8> {
    let registry = crate::load_registry(args.registry.as_deref())?;
    let data = crate::read_data(&args.data)?;
    let (output, code) = normalize_document(&registry, &args.schema, &data, args.raw)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(code)
}

/// Normalize `data` against the named definition, returning the document
/// to print and the exit code.
pub fn normalize_document(
    registry: &Registry,
    schema_name: &str,
    data: &Value,
    raw: bool,
) -> Result<(Value, u8)> {
    let schema = crate::lookup_schema(registry, schema_name)?;
    if !raw {
        return Ok((merge_default(schema, data), 0));
    }

    let normalized = normalize(schema, data, None);
    for error in &normalized.errors {
        tracing::warn!(schema = schema_name, property = %error.property, "required property missing");
    }
    let code = u8::from(!normalized.is_complete());
    Ok((serde_json::to_value(&normalized)?, code))
}
