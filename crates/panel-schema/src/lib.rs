//! # panel-schema: Request Schema Normalization
//!
//! Fills default values into request and response data according to a
//! JSON-Schema-like description, and hosts the schema tables the request
//! layer consults.
//!
//! ## Normalization (`normalize`)
//!
//! [`normalize`] walks a [`Schema`] alongside candidate data and returns a
//! new, defaulted value plus a list of [`PropertyMissing`] records for
//! required properties nothing could fill. [`merge_default`] does the same
//! with the standard per-type fallback table and keeps only the value.
//! The walk never fails and never mutates its input.
//!
//! ## Definitions (`definitions`)
//!
//! [`Registry::builtin`] holds the shipped `Content` and `Createquestion`
//! schemas and the `validators`, `filters` and `scopes` tables keyed by
//! `(endpoint, method)`. It is built once per process.
//!
//! ## Constraint Validation (`validate`)
//!
//! [`ConstraintValidator`] enforces `minLength`, `maxItems`, `maximum` and
//! the other constraint keywords via the `jsonschema` crate. It is a
//! separate pass, run by callers after normalization.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `panel-*` crates.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Normalization is total: malformed schemas degrade, they do not error.

pub mod accessor;
pub mod definitions;
pub mod document;
pub mod normalize;
pub mod schema;
pub mod validate;

pub use accessor::{Accessor, Attributes, Data};
pub use definitions::{
    content_schema, create_question_schema, EndpointKey, Registry, RegistryError,
    RequestSchemas, ResponseFilter,
};
pub use document::read_document;
pub use normalize::{
    merge_default, merge_default_with_errors, normalize, Normalized, PropertyMissing,
    TypeDefaults, PROPERTY_MISSING,
};
pub use schema::{AdditionalProperties, Schema, SchemaType};
pub use validate::{
    ConstraintValidator, SchemaValidationError, ValidationViolations, Violation,
};
