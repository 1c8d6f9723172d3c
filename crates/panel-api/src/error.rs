//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every error response has the body
//! `{"error": {"code": "...", "message": "...", "details": ...}}`.
//! `details` is present only for request normalization and validation
//! failures, where it lists the individual problems.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use panel_schema::{PropertyMissing, SchemaValidationError, ValidationViolations};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "BAD_REQUEST", "PROPERTY_MISSING").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Individual problems, present only for request-shape errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Required request properties could not be filled (422).
    #[error("missing required properties in {location}")]
    PropertyMissing {
        /// Request location: `headers`, `args` or `json`.
        location: &'static str,
        errors: Vec<PropertyMissing>,
    },

    /// A normalized request location violates its schema constraints (422).
    #[error("{location} failed validation:\n{violations}")]
    ConstraintViolation {
        location: &'static str,
        violations: ValidationViolations,
    },

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure: missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure: endpoint not reachable with this configuration (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::PropertyMissing { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "PROPERTY_MISSING"),
            Self::ConstraintViolation { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::PropertyMissing { errors, .. } => serde_json::to_value(errors).ok(),
            Self::ConstraintViolation { violations, .. } => serde_json::to_value(violations).ok(),
            _ => None,
        }
    }

    /// Map a constraint-pass error for one request location.
    pub(crate) fn from_validation(location: &'static str, err: SchemaValidationError) -> Self {
        match err {
            SchemaValidationError::ValidationFailed { violations, .. } => {
                Self::ConstraintViolation {
                    location,
                    violations,
                }
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}
