//! # Constraint Validation
//!
//! A separate pass run *after* normalization that enforces the constraint
//! keywords the normalizer ignores: `type`, `minLength`, `maxLength`,
//! `maximum`, `maxItems`, `enum`, `pattern` and so on.
//!
//! Request handling is two steps: first fill defaults with
//! [`crate::normalize`], then reject anything that still violates the
//! schema here. Keeping them apart means the normalizer stays total and
//! side-effect free.
//!
//! ## Draft
//!
//! Validators compile as Draft 4. The shipped schemas still carry Draft 3
//! per-property `required: false` flags and empty `required: []` lists;
//! both are stripped before compilation since Draft 4 requires `required`
//! to be a non-empty array.

use std::fmt;

use jsonschema::{Draft, Validator};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::Schema;

/// Error during constraint validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The compiled validator could not be built (e.g., invalid schema).
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema name or request location.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },

    /// The document file could not be loaded or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoadError {
        /// Path to the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A compiled constraint validator for one schema.
///
/// `Send + Sync`; build once and share.
pub struct ConstraintValidator {
    schema_name: String,
    validator: Validator,
}

impl fmt::Debug for ConstraintValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintValidator")
            .field("schema_name", &self.schema_name)
            .finish_non_exhaustive()
    }
}

impl ConstraintValidator {
    /// Compile a validator for `schema`. `schema_name` only labels errors.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidatorBuildError` if the schema
    /// is not a valid Draft 4 schema (e.g. an unknown `type` name).
    pub fn new(
        schema_name: impl Into<String>,
        schema: &Schema,
    ) -> Result<Self, SchemaValidationError> {
        let schema_name = schema_name.into();
        let compiled = strip_unsupported_required(schema.raw());
        let validator = jsonschema::options()
            .with_draft(Draft::Draft4)
            .build(&compiled)
            .map_err(|e| SchemaValidationError::ValidatorBuildError {
                schema_name: schema_name.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            schema_name,
            validator,
        })
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Every violation of `instance`, in the order the validator reports them.
    pub fn violations(&self, instance: &Value) -> ValidationViolations {
        ValidationViolations {
            violations: self
                .validator
                .iter_errors(instance)
                .map(|e| Violation {
                    instance_path: e.instance_path.to_string(),
                    schema_path: e.schema_path.to_string(),
                    message: e.to_string(),
                })
                .collect(),
        }
    }

    /// Validate `instance`, failing with all violations at once.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidationFailed` with structured
    /// violation details if the instance is invalid.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaValidationError> {
        let violations = self.violations(instance);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name: self.schema_name.clone(),
                violations,
            })
        }
    }
}

/// Remove `required` keywords Draft 4 rejects (booleans, empty arrays)
/// anywhere in the tree. Keys under `properties` are property names, not
/// keywords, and are kept.
fn strip_unsupported_required(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, v)| !(k.as_str() == "required" && !is_required_list(v)))
                .map(|(k, v)| {
                    let v = if k == "properties" {
                        match v {
                            Value::Object(props) => Value::Object(
                                props
                                    .iter()
                                    .map(|(name, sub)| (name.clone(), strip_unsupported_required(sub)))
                                    .collect(),
                            ),
                            other => other.clone(),
                        }
                    } else {
                        strip_unsupported_required(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_unsupported_required).collect()),
        other => other.clone(),
    }
}

fn is_required_list(value: &Value) -> bool {
    value.as_array().is_some_and(|names| !names.is_empty())
}
