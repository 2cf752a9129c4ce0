use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::db::StorageError;
use crate::models::ValidationError;
use crate::utils::response::error as error_response;

/// Seconds a client should wait before retrying a busy write.
const RETRY_AFTER_SECS: &str = "1";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {message}")]
    ValidationError {
        field: Option<&'static str>,
        message: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Storage busy")]
    StorageBusy(#[source] StorageError),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Database error")]
    DatabaseError(#[source] StorageError),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            field: None,
            message: message.into(),
        }
    }

    pub fn event_not_found(id: i64) -> Self {
        AppError::NotFound(format!("Event {id} not found"))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StorageBusy(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::StorageBusy(_) => "STORAGE_BUSY",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError { field, message } => {
                warn!(field = ?field, message = %message, "Rejected request");
            }
            AppError::NotFound(msg) => {
                warn!(message = %msg, "Resource not found");
            }
            AppError::StorageBusy(e) => {
                warn!(error = ?e, "Storage busy; request may be retried");
            }
            AppError::ServiceUnavailable(msg) => {
                error!(message = %msg, "Service unavailable");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::ValidationError {
            field: Some(err.field),
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            err if err.is_transient() => AppError::StorageBusy(err),
            StorageError::Unavailable(e) => {
                error!(error = ?e, "Storage unreachable");
                AppError::ServiceUnavailable("Storage is unavailable".to_string())
            }
            err => AppError::DatabaseError(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level message to the client
        let (public_message, details) = match &self {
            AppError::ValidationError { field, message } => {
                (message.clone(), field.map(|f| json!({ "field": f })))
            }
            AppError::NotFound(msg) | AppError::ServiceUnavailable(msg) => (msg.clone(), None),
            AppError::StorageBusy(_) => ("Storage is busy, please retry".to_string(), None),
            AppError::DatabaseError(_) => ("A database error occurred".to_string(), None),
        };

        let mut response = error_response(code, public_message, details, status);
        if matches!(self, AppError::StorageBusy(_)) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}
