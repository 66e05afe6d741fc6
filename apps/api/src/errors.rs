use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::intake::scanner::ScanError;
use crate::reports::store::StoreError;

/// A single field-level validation failure, surfaced in the `errors` array.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Failure of one stage of the analysis pipeline.
///
/// Every stage returns this type; `AppError::from` maps each variant to exactly
/// one HTTP-facing error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Malicious file detected: {0}")]
    MalwareDetected(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to extract resume text: {0}")]
    ExtractionFailed(String),

    #[error("Malware scan failed: {0}")]
    ScanFailed(#[from] ScanError),

    #[error("Report store error: {0}")]
    Store(#[from] StoreError),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Malware detected: {0}")]
    MalwareDetected(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Not found: {0}")]
    NotFoundOrNotOwned(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        AppError::Validation {
            message: message.into(),
            errors,
        }
    }

    /// Stable machine-readable code, also used by tests.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidUpload(_) => "INVALID_UPLOAD",
            AppError::MalwareDetected(_) => "MALWARE_DETECTED",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::ExtractionFailed(_) => "EXTRACTION_FAILED",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFoundOrNotOwned(_) => "NOT_FOUND",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidUpload(msg) => AppError::InvalidUpload(msg),
            PipelineError::MalwareDetected(msg) => AppError::MalwareDetected(msg),
            PipelineError::UnsupportedFormat(mime) => AppError::UnsupportedFormat(mime),
            PipelineError::ExtractionFailed(msg) => AppError::ExtractionFailed(msg),
            PipelineError::ScanFailed(e) => {
                AppError::Internal(anyhow::anyhow!("malware scanner unavailable: {e}"))
            }
            PipelineError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => AppError::Database(e),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message, errors) = match self {
            AppError::InvalidUpload(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::MalwareDetected(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Malicious file detected. {msg}"),
                None,
            ),
            AppError::UnsupportedFormat(mime) => (
                StatusCode::BAD_REQUEST,
                format!("Unsupported resume file type: {mime}"),
                None,
            ),
            AppError::ExtractionFailed(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Failed to process resume file: {msg}"),
                None,
            ),
            AppError::Validation { message, errors } => {
                (StatusCode::BAD_REQUEST, message, Some(errors))
            }
            AppError::NotFoundOrNotOwned(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
                None,
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred. Please try again.".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "success": false,
            "code": code,
            "message": message,
        });
        if let Some(errors) = errors {
            body["errors"] = json!(errors);
        }

        (status, Json(body)).into_response()
    }
}
