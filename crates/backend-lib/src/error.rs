// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use linkshelf_common::{ErrorBody, ErrorDetail};
use thiserror::Error;

use crate::auth::{AuthRejection, CredentialError};
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Unauthenticated(#[from] AuthRejection),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Un-authorized access! Not an admin.")]
    NotAdmin,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(AuthRejection::HeaderNotSet)
            | AppError::Unauthenticated(AuthRejection::BearerTokenMissing) => {
                StatusCode::BAD_REQUEST
            },
            AppError::Unauthenticated(AuthRejection::InvalidToken)
            | AppError::InvalidCredentials
            | AppError::NotAdmin => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_)
            | AppError::Json(_)
            | AppError::Credential(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(AuthRejection::HeaderNotSet) => "AUTH_001",
            AppError::Unauthenticated(AuthRejection::BearerTokenMissing) => "AUTH_002",
            AppError::Unauthenticated(AuthRejection::InvalidToken) => "AUTH_003",
            AppError::InvalidCredentials => "AUTH_004",
            AppError::Forbidden(_) => "AUTH_005",
            AppError::NotAdmin => "AUTH_006",
            AppError::NotFound(_) => "NF_001",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Conflict(_) => "CONFLICT_001",
            AppError::Storage(_) => "DB_001",
            AppError::Json(_) => "JSON_001",
            AppError::Credential(_) => "CRED_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    ///
    /// Client errors are already safe to show; server errors are not.
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Storage(_) | AppError::Json(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
            AppError::Credential(_) => "Could not process credentials".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "request rejected");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                title: status.canonical_reason().unwrap_or("Error").to_string(),
                message,
            },
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {err}"))
    }
}
