//! # Scope Checks
//!
//! Every endpoint in the registry declares the scopes it accepts. The
//! `open` scope (or no declared scopes at all) means anyone may call it.
//! Any other scope set requires `Authorization: Bearer <token>` matching
//! the configured token; with no token configured such endpoints are
//! closed.

use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Scope that makes an endpoint public.
pub const OPEN_SCOPE: &str = "open";

/// Constant-time comparison of bearer tokens.
///
/// When lengths differ, performs a dummy comparison so the timing does not
/// depend on where the mismatch is.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Authorize a request against an endpoint's declared scopes.
pub fn check_scopes(
    scopes: &[String],
    expected_token: Option<&str>,
    headers: &HeaderMap,
) -> Result<(), AppError> {
    if scopes.is_empty() || scopes.iter().any(|s| s == OPEN_SCOPE) {
        return Ok(());
    }

    let Some(expected) = expected_token else {
        tracing::warn!(?scopes, "scoped endpoint called but no auth token is configured");
        return Err(AppError::Forbidden(format!(
            "endpoint requires scopes {scopes:?}"
        )));
    };

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) if value.starts_with("Bearer ") => {
            if constant_time_token_eq(&value[7..], expected) {
                Ok(())
            } else {
                tracing::warn!("authentication failed: invalid bearer token");
                Err(AppError::Unauthorized("invalid bearer token".to_string()))
            }
        }
        Some(_) => {
            tracing::warn!("authentication failed: non-Bearer authorization scheme");
            Err(AppError::Unauthorized(
                "authorization header must use Bearer scheme".to_string(),
            ))
        }
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            Err(AppError::Unauthorized(
                "missing authorization header".to_string(),
            ))
        }
    }
}
