//! Content Error Types
//!
//! Content-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::storage::StorageError;
use platform::task::TaskError;
use thiserror::Error;

/// Content-specific result type alias
pub type ContentResult<T> = Result<T, ContentError>;

#[derive(Debug, Error)]
pub enum ContentError {
    /// Missing, or a draft the caller may not see
    #[error("Material not found")]
    MaterialNotFound,

    #[error("Block not found")]
    BlockNotFound,

    #[error("Subject not found")]
    SubjectNotFound,

    /// Caller does not own the material
    #[error("Only the author can modify this material")]
    NotOwner,

    #[error("Material is already published")]
    AlreadyPublished,

    #[error("A published material must have at least one block")]
    EmptyMaterial,

    /// Reorder list is not a permutation of the current block ids
    #[error("Block order must list every block of the material exactly once")]
    InvalidOrder,

    #[error("Subject already exists")]
    SubjectExists,

    /// Optimistic version check failed
    #[error("Material was modified concurrently, please retry")]
    ConcurrentModification,

    /// Input validation (carries the user-facing message and action)
    #[error("{0}")]
    Validation(#[from] AppError),

    #[error("Object storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ContentError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContentError::MaterialNotFound
            | ContentError::BlockNotFound
            | ContentError::SubjectNotFound => ErrorKind::NotFound,
            ContentError::NotOwner => ErrorKind::Forbidden,
            ContentError::AlreadyPublished
            | ContentError::EmptyMaterial
            | ContentError::InvalidOrder
            | ContentError::SubjectExists
            | ContentError::ConcurrentModification => ErrorKind::Conflict,
            ContentError::Validation(err) => err.kind(),
            ContentError::Storage(StorageError::InvalidKey(_)) => ErrorKind::BadRequest,
            ContentError::Storage(StorageError::Timeout | StorageError::Unavailable(_)) => {
                ErrorKind::ServiceUnavailable
            }
            ContentError::Storage(_) | ContentError::Database(_) | ContentError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError
    pub fn into_app_error(self) -> AppError {
        match self {
            ContentError::Validation(err) => err,
            ContentError::Database(err) => AppError::from(err),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            ContentError::Database(e) => {
                tracing::error!(error = %e, "Content database error");
            }
            ContentError::Storage(e) => {
                tracing::error!(error = %e, "Content object storage error");
            }
            ContentError::Internal(msg) => {
                tracing::error!(message = %msg, "Content internal error");
            }
            ContentError::NotOwner => {
                tracing::warn!("Non-owner attempted to modify a material");
            }
            ContentError::ConcurrentModification => {
                tracing::info!("Material save lost an optimistic version race");
            }
            _ => {
                tracing::debug!(error = %self, "Content error");
            }
        }
    }
}

impl IntoResponse for ContentError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<TaskError> for ContentError {
    fn from(err: TaskError) -> Self {
        ContentError::Internal(err.to_string())
    }
}
