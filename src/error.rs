/// Unified error types for the streamhub backend
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors (bad credentials, missing/invalid/expired/stale token)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Validation errors (missing or malformed input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (duplicate username or email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Media storage errors
    #[error("Media storage error: {0}")]
    MediaStorage(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Map a database error from a write that races a UNIQUE constraint
    ///
    /// Uniqueness pre-checks are advisory; the constraint is the authority.
    /// A violation keeps the 409 contract instead of surfacing as a 500.
    pub fn from_db_write(e: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::Conflict(conflict_message.to_string());
            }
        }
        AppError::Database(e)
    }
}

/// Failure response envelope
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub success: bool,
    pub errors: Vec<String>,
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::Database(_)
            | AppError::MediaStorage(_)
            | AppError::Internal(_)
            | AppError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                // Don't leak details
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            status_code: status.as_u16(),
            message,
            success: false,
            errors: Vec::new(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::Validation("missing field".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Authentication("bad password".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::NotFound("no user".into()), StatusCode::NOT_FOUND),
            (
                AppError::Conflict("username taken".into()),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let resp = err.into_response();
            assert_eq!(resp.status(), expected);
        }
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let resp = AppError::MediaStorage("disk path /secret/xyz".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
