//! # Definitions Registry
//!
//! Named schemas plus the per-endpoint request validators, response
//! filters and scopes the request layer consults.
//!
//! The built-in registry ([`Registry::builtin`]) is assembled once per
//! process and shared read-only afterwards. A registry can also be loaded
//! from a JSON or YAML document with this layout:
//!
//! ```json
//! {
//!   "definitions": { "Content": { "type": "string" } },
//!   "validators": { "game_roles": { "POST": { "headers": {}, "args": {}, "json": {} } } },
//!   "filters":    { "game_roles": { "POST": { "201": { "headers": null, "schema": {} } } } },
//!   "scopes":     { "game_roles": { "POST": ["open"] } }
//! }
//! ```
//!
//! Structural problems in that document (a filter keyed by something other
//! than a status code, scopes that are not strings) are errors. Problems
//! inside individual schemas are not; see [`crate::schema`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::schema::Schema;

/// Registry name of [`content_schema`].
pub const CONTENT: &str = "Content";
/// Registry name of [`create_question_schema`].
pub const CREATE_QUESTION: &str = "Createquestion";

/// Error loading a registry document.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The document parsed, but does not have the registry layout.
    #[error("malformed registry at '{path}': {reason}")]
    Malformed {
        /// JSON Pointer to the offending node.
        path: String,
        reason: String,
    },

    /// The document could not be read or parsed.
    #[error("registry load error for '{path}': {reason}")]
    Load { path: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// An `(endpoint, method)` pair. Methods are stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointKey {
    pub endpoint: String,
    pub method: String,
}

impl EndpointKey {
    pub fn new(endpoint: impl Into<String>, method: &str) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: method.to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)
    }
}

/// Schemas for each request location of one endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSchemas {
    pub headers: Option<Schema>,
    pub args: Option<Schema>,
    pub json: Option<Schema>,
}

/// Response shaping for one status code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseFilter {
    pub headers: Option<Schema>,
    pub schema: Option<Schema>,
}

/// Named schemas and endpoint tables.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    definitions: BTreeMap<String, Schema>,
    validators: BTreeMap<EndpointKey, RequestSchemas>,
    filters: BTreeMap<EndpointKey, BTreeMap<u16, ResponseFilter>>,
    scopes: BTreeMap<EndpointKey, Vec<String>>,
}

impl Registry {
    /// The registry shipped with the crate.
    pub fn builtin() -> &'static Registry {
        static BUILTIN: OnceLock<Registry> = OnceLock::new();
        BUILTIN.get_or_init(build_builtin)
    }

    /// Build a registry from a parsed document.
    pub fn from_value(doc: &Value) -> Result<Self, RegistryError> {
        let root = expect_object(doc, "")?;
        let mut registry = Registry::default();

        if let Some(defs) = root.get("definitions") {
            for (name, schema) in expect_object(defs, "/definitions")? {
                registry
                    .definitions
                    .insert(name.clone(), Schema::from_value(schema));
            }
        }

        if let Some(validators) = root.get("validators") {
            for (key, locations, path) in endpoint_entries(validators, "/validators")? {
                let locations = expect_object(locations, &path)?;
                registry.validators.insert(
                    key,
                    RequestSchemas {
                        headers: optional_schema(locations.get("headers")),
                        args: optional_schema(locations.get("args")),
                        json: optional_schema(locations.get("json")),
                    },
                );
            }
        }

        if let Some(filters) = root.get("filters") {
            for (key, by_status, path) in endpoint_entries(filters, "/filters")? {
                let mut table = BTreeMap::new();
                for (status, filter) in expect_object(by_status, &path)? {
                    let status_path = format!("{path}/{}", pointer_segment(status));
                    let code: u16 = status.parse().map_err(|_| RegistryError::Malformed {
                        path: status_path.clone(),
                        reason: "filter keys must be HTTP status codes".to_string(),
                    })?;
                    let filter = expect_object(filter, &status_path)?;
                    table.insert(
                        code,
                        ResponseFilter {
                            headers: optional_schema(filter.get("headers")),
                            schema: optional_schema(filter.get("schema")),
                        },
                    );
                }
                registry.filters.insert(key, table);
            }
        }

        if let Some(scopes) = root.get("scopes") {
            for (key, list, path) in endpoint_entries(scopes, "/scopes")? {
                let names = list
                    .as_array()
                    .ok_or_else(|| RegistryError::Malformed {
                        path: path.clone(),
                        reason: "scopes must be an array of strings".to_string(),
                    })?
                    .iter()
                    .map(|s| {
                        s.as_str().map(str::to_string).ok_or_else(|| RegistryError::Malformed {
                            path: path.clone(),
                            reason: format!("scope {s} is not a string"),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                registry.scopes.insert(key, names);
            }
        }

        Ok(registry)
    }

    /// Load a registry document from disk. `.yaml`/`.yml` files are read as
    /// YAML, everything else as JSON.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        let doc = crate::document::parse_document(&content, path).map_err(|reason| {
            RegistryError::Load {
                path: path.display().to_string(),
                reason,
            }
        })?;
        let registry = Self::from_value(&doc)?;
        tracing::debug!(
            path = %path.display(),
            definitions = registry.definitions.len(),
            endpoints = registry.endpoints().len(),
            "loaded schema registry"
        );
        Ok(registry)
    }

    /// Register or replace a named schema.
    pub fn insert_definition(&mut self, name: impl Into<String>, schema: Schema) {
        self.definitions.insert(name.into(), schema);
    }

    pub fn definition(&self, name: &str) -> Option<&Schema> {
        self.definitions.get(name)
    }

    pub fn definition_names(&self) -> Vec<&str> {
        self.definitions.keys().map(String::as_str).collect()
    }

    pub fn validator(&self, endpoint: &str, method: &str) -> Option<&RequestSchemas> {
        self.validators.get(&EndpointKey::new(endpoint, method))
    }

    pub fn filter(&self, endpoint: &str, method: &str, status: u16) -> Option<&ResponseFilter> {
        self.filters
            .get(&EndpointKey::new(endpoint, method))
            .and_then(|by_status| by_status.get(&status))
    }

    /// Scopes declared for an endpoint; empty when none are declared.
    pub fn scopes(&self, endpoint: &str, method: &str) -> &[String] {
        self.scopes
            .get(&EndpointKey::new(endpoint, method))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every endpoint mentioned by any table, sorted.
    pub fn endpoints(&self) -> Vec<&EndpointKey> {
        let mut keys: Vec<&EndpointKey> = self
            .validators
            .keys()
            .chain(self.filters.keys())
            .chain(self.scopes.keys())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// `{"type": "string", "minLength": 2, "maxLength": 1024}`
pub fn content_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| Schema::from_value(&content_literal()))
}

/// Object requiring `content`, with optional `is_public`, `images` (up to
/// three strings) and `form_id`.
pub fn create_question_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| Schema::from_value(&create_question_literal()))
}

fn content_literal() -> Value {
    json!({"minLength": 2, "type": "string", "maxLength": 1024})
}

fn create_question_literal() -> Value {
    json!({
        "required": ["content"],
        "properties": {
            "content": content_literal(),
            "is_public": {"type": "boolean"},
            "images": {"items": {"type": "string"}, "type": "array", "maxItems": 3},
            "form_id": {"type": "string"}
        }
    })
}

fn build_builtin() -> Registry {
    let content = content_schema();

    let mut registry = Registry::default();
    registry.insert_definition(CONTENT, content.clone());
    registry.insert_definition(CREATE_QUESTION, create_question_schema().clone());

    let game_roles_get = EndpointKey::new("game_roles", "GET");
    let game_roles_post = EndpointKey::new("game_roles", "POST");

    registry.validators.insert(
        game_roles_get.clone(),
        RequestSchemas {
            headers: Some(Schema::from_value(&json!({
                "required": [],
                "properties": {"Authorization": {"required": false, "type": "string"}}
            }))),
            args: Some(Schema::from_value(&json!({
                "required": [],
                "properties": {
                    "per_page": {"description": "per_page number", "format": "int32", "required": false, "type": "integer", "maximum": 100},
                    "limit": {"description": "limit number", "format": "int32", "required": false, "type": "integer", "maximum": 100},
                    "page": {"description": "page number", "format": "int32", "required": false, "type": "integer", "maximum": 10000},
                    "offset": {"description": "offset number", "format": "int32", "required": false, "type": "integer"}
                }
            }))),
            json: None,
        },
    );
    registry.validators.insert(
        game_roles_post.clone(),
        RequestSchemas {
            headers: Some(Schema::from_value(&json!({
                "required": [],
                "properties": {"Authorization": {"type": "string"}}
            }))),
            args: None,
            json: Some(create_question_schema().clone()),
        },
    );

    registry.filters.insert(
        game_roles_get.clone(),
        BTreeMap::from([(
            200,
            ResponseFilter {
                headers: None,
                schema: Some(Schema::from_value(&json!({
                    "items": content_literal(),
                    "type": "array"
                }))),
            },
        )]),
    );
    registry.filters.insert(
        game_roles_post.clone(),
        BTreeMap::from([(
            201,
            ResponseFilter {
                headers: None,
                schema: Some(content.clone()),
            },
        )]),
    );

    registry
        .scopes
        .insert(game_roles_get, vec!["open".to_string()]);
    registry
        .scopes
        .insert(game_roles_post, vec!["open".to_string()]);

    registry
}

fn expect_object<'v>(value: &'v Value, path: &str) -> Result<&'v Map<String, Value>, RegistryError> {
    value.as_object().ok_or_else(|| RegistryError::Malformed {
        path: if path.is_empty() { "/".to_string() } else { path.to_string() },
        reason: "expected an object".to_string(),
    })
}

/// `null` in a location slot means "no schema".
fn optional_schema(value: Option<&Value>) -> Option<Schema> {
    value.filter(|v| !v.is_null()).map(Schema::from_value)
}

/// Escape a key for use as a JSON Pointer reference token (RFC 6901).
fn pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Flatten `{endpoint: {METHOD: x}}` into `(key, x, pointer)` triples.
fn endpoint_entries<'v>(
    table: &'v Value,
    path: &str,
) -> Result<Vec<(EndpointKey, &'v Value, String)>, RegistryError> {
    let mut out = Vec::new();
    for (endpoint, methods) in expect_object(table, path)? {
        let endpoint_path = format!("{path}/{}", pointer_segment(endpoint));
        for (method, entry) in expect_object(methods, &endpoint_path)? {
            out.push((
                EndpointKey::new(endpoint.clone(), method),
                entry,
                format!("{endpoint_path}/{}", pointer_segment(method)),
            ));
        }
    }
    Ok(out)
}
