//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! - **Config**: bind port and optional bearer token, read from the
//!   environment.
//! - **Registry**: the schema tables (validators, filters, scopes). Shared
//!   read-only.
//! - **Constraint validators**: compiled once per request location at
//!   startup, so handlers never compile schemas.
//! - **Questions**: in-memory store of created questions. Durable
//!   persistence belongs to the database layer, which is not part of this
//!   service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use panel_schema::{ConstraintValidator, EndpointKey, Registry, SchemaValidationError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Bearer token accepted for endpoints without the `open` scope.
    /// If `None`, such endpoints are unreachable.
    pub auth_token: Option<String>,
}

impl AppConfig {
    /// Read `PORT` and `PANEL_AUTH_TOKEN`. Unset or unparsable values fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let auth_token = std::env::var("PANEL_AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        Self { port, auth_token }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
        }
    }
}

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot` and never held across an `.await`.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records, in no particular order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A question posted to `/game_roles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: Uuid,
    /// Creation order within this process; listings sort by it.
    pub seq: u64,
    pub content: String,
    pub is_public: bool,
    pub images: Vec<String>,
    pub form_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request location a compiled validator applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Headers,
    Args,
    Json,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Headers => "headers",
            Self::Args => "args",
            Self::Json => "json",
        }
    }
}

/// Constraint validators for every request location the registry declares.
#[derive(Debug, Default)]
pub struct CompiledValidators {
    by_location: HashMap<(EndpointKey, Location), ConstraintValidator>,
}

impl CompiledValidators {
    /// Compile every validator schema in `registry`.
    ///
    /// # Errors
    ///
    /// Fails on the first schema the `jsonschema` crate rejects.
    pub fn compile(registry: &Registry) -> Result<Self, SchemaValidationError> {
        let mut by_location = HashMap::new();
        for key in registry.endpoints() {
            let Some(schemas) = registry.validator(&key.endpoint, &key.method) else {
                continue;
            };
            for (location, schema) in [
                (Location::Headers, &schemas.headers),
                (Location::Args, &schemas.args),
                (Location::Json, &schemas.json),
            ] {
                let Some(schema) = schema else { continue };
                let name = format!("{key} {}", location.as_str());
                let validator = ConstraintValidator::new(name, schema)?;
                by_location.insert((key.clone(), location), validator);
            }
        }
        tracing::debug!(count = by_location.len(), "compiled request validators");
        Ok(Self { by_location })
    }

    pub fn get(&self, key: &EndpointKey, location: Location) -> Option<&ConstraintValidator> {
        self.by_location.get(&(key.clone(), location))
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<Registry>,
    pub validators: Arc<CompiledValidators>,
    pub questions: Store<QuestionRecord>,
    question_seq: Arc<AtomicU64>,
}

impl AppState {
    /// State over the built-in registry with default configuration.
    pub fn try_new() -> Result<Self, SchemaValidationError> {
        Self::try_with_config(AppConfig::default())
    }

    /// State over the built-in registry.
    pub fn try_with_config(config: AppConfig) -> Result<Self, SchemaValidationError> {
        Self::try_with_registry(config, Registry::builtin().clone())
    }

    /// State over a caller-supplied registry.
    pub fn try_with_registry(
        config: AppConfig,
        registry: Registry,
    ) -> Result<Self, SchemaValidationError> {
        let validators = CompiledValidators::compile(&registry)?;
        Ok(Self {
            config,
            registry: Arc::new(registry),
            validators: Arc::new(validators),
            questions: Store::new(),
            question_seq: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Next question sequence number. Strictly increasing across clones.
    pub fn next_question_seq(&self) -> u64 {
        self.question_seq.fetch_add(1, Ordering::Relaxed)
    }
}
