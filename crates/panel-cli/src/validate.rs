//! # Validate Subcommand
//!
//! Normalizes a data document (no type-default table, as the request layer
//! does) and then runs the constraint pass over the result. Missing
//! required properties are reported on their own; the constraint pass only
//! runs on complete documents.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use panel_schema::{normalize, ConstraintValidator, Registry};
use serde_json::Value;

/// Arguments for the `panel validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Registry definition to validate against.
    #[arg(long)]
    pub schema: String,

    /// Registry document (JSON or YAML). Defaults to the built-in registry.
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Data file, or `-` for JSON on stdin.
    #[arg(value_name = "DATA")]
    pub data: PathBuf,
}

/// Outcome of validating one document.
#[derive(Debug, Default, PartialEq)]
pub struct Report {
    /// One line per missing property or violation.
    pub failures: Vec<String>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let registry = crate::load_registry(args.registry.as_deref())?;
    let data = crate::read_data(&args.data)?;
    let report = validate_document(&registry, &args.schema, &data)?;

    if report.passed() {
        println!("OK: {} conforms to {}", args.data.display(), args.schema);
        return Ok(0);
    }
    println!("FAIL: {} against {}", args.data.display(), args.schema);
    for failure in &report.failures {
        println!("  {failure}");
    }
    Ok(1)
}

/// Normalize `data` and check the result against the named definition.
pub fn validate_document(registry: &Registry, schema_name: &str, data: &Value) -> Result<Report> {
    let schema = crate::lookup_schema(registry, schema_name)?;
    let validator = ConstraintValidator::new(schema_name, schema)?;

    let normalized = normalize(schema, data, None);
    let failures: Vec<String> = if normalized.is_complete() {
        validator
            .violations(&normalized.value)
            .into_inner()
            .into_iter()
            .map(|v| v.to_string().trim_start().to_string())
            .collect()
    } else {
        normalized.errors.iter().map(|e| e.to_string()).collect()
    };

    tracing::debug!(schema = schema_name, failures = failures.len(), "validated document");
    Ok(Report { failures })
}
