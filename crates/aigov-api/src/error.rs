//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`. Maps
//! domain errors from aigov-auth, aigov-policy, and aigov-replay to HTTP
//! status codes and JSON bodies. `DATA_INCOMPLETE` keeps its own code so
//! callers can distinguish "too old to replay" from "does not exist".
//! Internal error details are never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use aigov_auth::AuthError;
use aigov_policy::SnapshotError;
use aigov_replay::ReplayError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// The error payload.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "DATA_INCOMPLETE").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure (401). Uniform message on the wire.
    #[error("invalid credentials")]
    Unauthorized,

    /// Authorization failure (403). Uniform message on the wire.
    #[error("access denied")]
    Forbidden,

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The decision exists but cannot be replayed (409, DATA_INCOMPLETE).
    #[error("decision cannot be replayed: {0}")]
    DataIncomplete(String),

    /// Internal server error (500). Message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::DataIncomplete(_) => (StatusCode::CONFLICT, "DATA_INCOMPLETE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

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
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized,
            AuthError::Forbidden => Self::Forbidden,
            AuthError::ContextNotFound => Self::NotFound("context not found".to_string()),
            AuthError::NotFound(what) => Self::NotFound(what),
            AuthError::TransactionAborted(reason) => Self::Conflict(reason),
            AuthError::Validation(reason) => Self::Validation(reason),
        }
    }
}

impl From<SnapshotError> for AppError {
    fn from(err: SnapshotError) -> Self {
        match &err {
            SnapshotError::NoActive(_)
            | SnapshotError::VersionNotFound { .. }
            | SnapshotError::SnapshotNotFound(_) => Self::NotFound(err.to_string()),
            SnapshotError::VersionExists { .. } => Self::Conflict(err.to_string()),
            SnapshotError::InvalidRuleSet(_) => Self::Validation(err.to_string()),
        }
    }
}

impl From<ReplayError> for AppError {
    fn from(err: ReplayError) -> Self {
        match &err {
            ReplayError::NotFound(_) | ReplayError::PolicyNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            ReplayError::DataIncomplete(_) => Self::DataIncomplete(err.to_string()),
        }
    }
}
