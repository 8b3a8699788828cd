//! Application Error Types
//!
//! Centralized error handling shared by every service and repository.
//!
//! Failures fall into two tiers: validation errors (the caller sent
//! malformed or incomplete input) and technical errors (a referenced row is
//! missing or the database rejected a statement). Version mismatches on
//! update are reported separately as conflicts.

use serde::Serialize;

/// Fixed code reported for technical failures.
pub const TECHNICAL_ERROR_CODE: u16 = 10000;

/// Fixed code reported for optimistic-concurrency conflicts.
pub const CONFLICT_ERROR_CODE: u16 = 10005;

/// Fixed code reported for validation failures.
pub const VALIDATION_ERROR_CODE: u16 = 10007;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing input.
    Validation,
    /// Missing row or persistence failure.
    Technical,
    /// Version compare-and-swap failed.
    Conflict,
}

/// Error body handed to an outer adapter.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    /// Shorthand for a missing entity of the given type.
    pub fn not_found(entity: &str, key: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} {} not found", entity, key))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::NotFound(_) | AppError::Internal(_) | AppError::Database(_) => {
                ErrorKind::Technical
            }
        }
    }

    pub fn code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => VALIDATION_ERROR_CODE,
            ErrorKind::Technical => TECHNICAL_ERROR_CODE,
            ErrorKind::Conflict => CONFLICT_ERROR_CODE,
        }
    }

    /// Convert into a serializable body, hiding database internals.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        ErrorResponse {
            code: self.code(),
            kind: self.kind(),
            message,
        }
    }
}
