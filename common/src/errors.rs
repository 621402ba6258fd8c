//! Application error types.
//!
//! Every failure raised while serving a request ends up as an [`AppError`].
//! Errors propagate unchanged to the HTTP layer, where they are logged and
//! turned into a generic server error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::response::ErrorBody;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Startup configuration is incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The connection pool could not be created. Fatal at startup.
    #[error("Failed to create database connection pool: {0}")]
    PoolInit(String),

    /// A handler ran before the pool was initialized or after it was closed.
    #[error("Database connection pool is not initialized.")]
    PoolNotReady,

    /// The driver reported a connectivity or execution failure.
    #[error("Database connection error: {0}")]
    Database(String),

    /// The query succeeded but returned no rows.
    #[error("Database query did not return expected result.")]
    EmptyResult,

    /// A row had fewer columns than the target record needs.
    #[error("cannot map row to {record}: expected {expected} columns, got {actual}")]
    RowMapping {
        record: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl AppError {
    /// Stable code reported in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::PoolInit(_) => "POOL_INIT_ERROR",
            Self::PoolNotReady => "POOL_NOT_READY",
            Self::Database(_) => "DATABASE_ERROR",
            Self::EmptyResult => "EMPTY_RESULT",
            Self::RowMapping { .. } => "ROW_MAPPING_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the actual cause, return a generic message
        tracing::error!(code = self.code(), error = %self, "request failed");

        let status = self.status_code();
        let body = ErrorBody {
            code: self.code().to_string(),
            message: status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
        };
        (status, Json(body)).into_response()
    }
}
