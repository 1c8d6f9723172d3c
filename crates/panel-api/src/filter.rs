//! # Response Filtering
//!
//! Before a handler's body leaves the service it is passed through
//! `merge_default` against the filter schema registered for the endpoint
//! and status code. Statuses without a filter pass through untouched.
//! A filter `headers` schema contributes default response headers.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use panel_schema::{merge_default, EndpointKey, Registry};
use serde_json::Value;

/// Build the response for `body`, shaped by the registered filter.
pub fn respond(registry: &Registry, endpoint: &EndpointKey, status: StatusCode, body: Value) -> Response {
    let Some(filter) = registry.filter(&endpoint.endpoint, &endpoint.method, status.as_u16()) else {
        return (status, Json(body)).into_response();
    };

    let body = match &filter.schema {
        Some(schema) => merge_default(schema, &body),
        None => body,
    };
    let mut response = (status, Json(body)).into_response();

    if let Some(schema) = &filter.headers {
        if let Value::Object(defaults) = merge_default(schema, &Value::Null) {
            let headers = response.headers_mut();
            for (name, value) in defaults {
                let (Ok(name), Some(value)) = (
                    HeaderName::try_from(name.as_str()),
                    header_text(&value).and_then(|v| HeaderValue::from_str(&v).ok()),
                ) else {
                    tracing::warn!(header = %name, "skipping unrepresentable filter header");
                    continue;
                };
                headers.entry(name).or_insert(value);
            }
        }
    }

    response
}

fn header_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
