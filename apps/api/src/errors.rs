use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Stable, serializable error classification carried on reports and batch entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnreadablePdf,
    RejectedInput,
    ExtractionFailed,
    MatchFailed,
    GenerationFailed,
    StoreError,
    Cancelled,
    /// A worker task died without reporting an outcome.
    Internal,
}

/// Errors produced by the analysis core. Stage boundaries convert these into
/// `StageError`s on a `ResumeReport`; single-resume entry points return them as-is.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Unreadable PDF: {0}")]
    UnreadablePdf(String),

    #[error("Rejected input: {0}")]
    RejectedInput(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Match failed: {0}")]
    MatchFailed(String),

    #[error("Question generation failed: {0}")]
    GenerationFailed(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::UnreadablePdf(_) => ErrorKind::UnreadablePdf,
            AnalysisError::RejectedInput(_) => ErrorKind::RejectedInput,
            AnalysisError::ExtractionFailed(_) => ErrorKind::ExtractionFailed,
            AnalysisError::MatchFailed(_) => ErrorKind::MatchFailed,
            AnalysisError::GenerationFailed(_) => ErrorKind::GenerationFailed,
            AnalysisError::Store(_) => ErrorKind::StoreError,
            AnalysisError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => AppError::NotFound(format!("Resume {id} not found")),
            StoreError::Conflict(id) => {
                AppError::Conflict(format!("A report for resume {id} already exists"))
            }
            other => AppError::Store(other.to_string()),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::UnreadablePdf(msg) => {
                AppError::UnprocessableEntity(format!("Unreadable PDF: {msg}"))
            }
            AnalysisError::RejectedInput(msg) => AppError::Validation(msg),
            AnalysisError::ExtractionFailed(_)
            | AnalysisError::MatchFailed(_)
            | AnalysisError::GenerationFailed(_) => AppError::Analysis(e.to_string()),
            AnalysisError::Store(store) => store.into(),
            AnalysisError::Cancelled => AppError::Cancelled,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::Analysis(msg) => {
                tracing::error!("Analysis error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ANALYSIS_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Cancelled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CANCELLED",
                "The operation was cancelled".to_string(),
            ),
            AppError::Store(msg) => {
                tracing::error!("Store error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
