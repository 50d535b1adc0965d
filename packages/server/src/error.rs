use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct FieldViolation {
    /// Name of the offending input field.
    #[schema(example = "title")]
    pub field: String,
    /// What was wrong with it.
    #[schema(example = "Title must be at least 3 characters")]
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `FORBIDDEN`, `NOT_FOUND`,
    /// `EMAIL_TAKEN`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be at least 3 characters")]
    pub message: String,
    /// Per-field details, present for validation errors only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldViolation>>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(Vec<FieldViolation>),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    Forbidden,
    NotFound(String),
    EmailTaken,
    Internal(String),
}

impl AppError {
    /// Shorthand for a single-violation validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldViolation::new(field, message)])
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(violations) => {
                let message = violations
                    .first()
                    .map(|v| v.message.clone())
                    .unwrap_or_else(|| "Invalid input".to_string());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorBody {
                        code: "VALIDATION_ERROR",
                        message,
                        details: Some(violations),
                    },
                )
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                    details: None,
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired credential".into(),
                    details: None,
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid email or password".into(),
                    details: None,
                },
            ),
            // Uniform denial: the body never says whether the target exists
            // or who owns it.
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "FORBIDDEN",
                    message: "Not authorized".into(),
                    details: None,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                    details: None,
                },
            ),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "EMAIL_TAKEN",
                    message: "An account with this email already exists".into(),
                    details: None,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                        details: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("File not found".into()),
            StorageError::InvalidFileRef(msg) => AppError::validation("file_ref", msg),
            StorageError::RejectedContentType(content_type) => AppError::validation(
                "image",
                format!("Content type '{content_type}' is not allowed"),
            ),
            StorageError::SizeLimitExceeded { limit, .. } => AppError::validation(
                "image",
                format!("File exceeds maximum size of {limit} bytes"),
            ),
            StorageError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}
