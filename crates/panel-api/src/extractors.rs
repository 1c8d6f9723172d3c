//! # Request Normalization Extractor
//!
//! [`ValidatedRequest`] runs the per-endpoint request pipeline before a
//! handler sees anything:
//!
//! 1. Scope check against the registry's `scopes` table.
//! 2. Normalize headers, query args and the JSON body against the
//!    endpoint's validator schemas (raw `normalize`, no type-default table).
//! 3. Constraint pass over each normalized location.
//!
//! The endpoint name is the matched route path without its leading `/`,
//! so `/game_roles` reads the `game_roles` entries.

use std::collections::BTreeMap;

use axum::extract::{FromRequest, MatchedPath, Query, Request};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use panel_schema::{normalize, Attributes, Data, EndpointKey, Schema};
use serde_json::{Map, Value};

use crate::auth::check_scopes;
use crate::error::AppError;
use crate::state::{AppState, Location};

/// Largest request body the extractor will buffer.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// A request whose headers, args and body passed normalization and the
/// constraint pass. Locations without a schema are `null`.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub endpoint: EndpointKey,
    pub headers: Value,
    pub args: Value,
    pub json: Value,
}

impl FromRequest<AppState> for ValidatedRequest {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let endpoint = endpoint_key(&parts)?;

        check_scopes(
            state.registry.scopes(&endpoint.endpoint, &endpoint.method),
            state.config.auth_token.as_deref(),
            &parts.headers,
        )?;

        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read body: {e}")))?;

        let Some(schemas) = state.registry.validator(&endpoint.endpoint, &endpoint.method) else {
            return Ok(Self {
                endpoint,
                headers: Value::Null,
                args: Value::Null,
                json: Value::Null,
            });
        };

        let headers = match &schemas.headers {
            Some(schema) => {
                let raw = RequestHeaders(&parts.headers);
                let value = normalize_location(Location::Headers, schema, Data::attributes(&raw))?;
                check_location(state, &endpoint, Location::Headers, value)?
            }
            None => Value::Null,
        };

        let args = match &schemas.args {
            Some(schema) => {
                let Query(raw) = Query::<BTreeMap<String, String>>::try_from_uri(&parts.uri)
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                let typed = coerce_args(schema, raw);
                let value = normalize_location(Location::Args, schema, Data::from(&typed))?;
                check_location(state, &endpoint, Location::Args, value)?
            }
            None => Value::Null,
        };

        let json = match &schemas.json {
            Some(schema) => {
                let raw = parse_body(&bytes)?;
                let value = normalize_location(Location::Json, schema, Data::from(&raw))?;
                check_location(state, &endpoint, Location::Json, value)?
            }
            None => Value::Null,
        };

        Ok(Self {
            endpoint,
            headers,
            args,
            json,
        })
    }
}

fn endpoint_key(parts: &Parts) -> Result<EndpointKey, AppError> {
    let path = parts
        .extensions
        .get::<MatchedPath>()
        .ok_or_else(|| AppError::Internal("request reached extractor without a matched route".into()))?;
    Ok(EndpointKey::new(
        path.as_str().trim_start_matches('/'),
        parts.method.as_str(),
    ))
}

fn normalize_location(location: Location, schema: &Schema, data: Data<'_>) -> Result<Value, AppError> {
    let (value, errors) = normalize(schema, data, None).into_parts();
    if errors.is_empty() {
        Ok(value)
    } else {
        tracing::info!(
            location = location.as_str(),
            missing = errors.len(),
            "request rejected: required properties missing"
        );
        Err(AppError::PropertyMissing {
            location: location.as_str(),
            errors,
        })
    }
}

fn check_location(
    state: &AppState,
    endpoint: &EndpointKey,
    location: Location,
    value: Value,
) -> Result<Value, AppError> {
    if let Some(validator) = state.validators.get(endpoint, location) {
        validator
            .validate(&value)
            .map_err(|e| AppError::from_validation(location.as_str(), e))?;
    }
    Ok(value)
}

fn parse_body(bytes: &[u8]) -> Result<Value, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))
}

/// Query strings are untyped. Values whose property schema names a numeric
/// or boolean type are converted when they parse; everything else stays a
/// string and is left to the constraint pass.
fn coerce_args(schema: &Schema, raw: BTreeMap<String, String>) -> Value {
    let map: Map<String, Value> = raw
        .into_iter()
        .map(|(name, text)| {
            let kind = schema.property(&name).map(|p| p.kind().as_str().to_string());
            let value = match kind.as_deref() {
                Some("integer") => text.parse::<i64>().map(Value::from).ok(),
                Some("number") => text
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number),
                Some("boolean") => match text.as_str() {
                    "true" | "1" => Some(Value::Bool(true)),
                    "false" | "0" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            };
            (name, value.unwrap_or(Value::String(text)))
        })
        .collect();
    Value::Object(map)
}

/// Header map viewed as named attributes. Lookups are case-insensitive;
/// non-UTF-8 values read as absent.
struct RequestHeaders<'a>(&'a HeaderMap);

impl Attributes for RequestHeaders<'_> {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.0
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| Value::String(v.to_string()))
    }

    fn attribute_names(&self) -> Vec<String> {
        self.0.keys().map(|k| k.as_str().to_string()).collect()
    }
}
