/// Error types for nutritionist-service
///
/// Every variant renders through the same response envelope as successful
/// calls. Store and internal faults are logged with their detail and answered
/// with a generic message.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;
use tracing::error;

use crate::handlers::ApiResponse;

/// Result type for nutritionist-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Requested nutritionist does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request parameters
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Record store unreachable; safe for the caller to retry
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store reachable but the query failed
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message that is safe to hand back to API clients.
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::ValidationError(msg) => msg.clone(),
            AppError::StoreUnavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        }

        HttpResponse::build(status).json(ApiResponse::<()>::failure(status, self.public_message()))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => AppError::StoreUnavailable(err.to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}
