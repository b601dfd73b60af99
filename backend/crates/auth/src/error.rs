//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::storage::StorageError;
use platform::task::TaskError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Any access, refresh or reset token failure. The concrete reason
    /// (expired, malformed, revoked, replayed) is only logged.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Account is blocked")]
    AccountBlocked,

    /// Role check failed
    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Administrators cannot block themselves")]
    CannotBlockSelf,

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

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials | AuthError::Unauthorized => ErrorKind::Unauthorized,
            AuthError::AccountBlocked | AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::EmailTaken | AuthError::CannotBlockSelf => ErrorKind::Conflict,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::Validation(err) => err.kind(),
            AuthError::Storage(StorageError::InvalidKey(_)) => ErrorKind::BadRequest,
            AuthError::Storage(StorageError::Timeout | StorageError::Unavailable(_)) => {
                ErrorKind::ServiceUnavailable
            }
            AuthError::Storage(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError
    pub fn into_app_error(self) -> AppError {
        match self {
            AuthError::Validation(err) => err,
            AuthError::Database(err) => AppError::from(err),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Storage(e) => {
                tracing::error!(error = %e, "Auth object storage error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountBlocked => {
                tracing::warn!("Login attempt on blocked account");
            }
            AuthError::Forbidden => {
                tracing::warn!("Role check rejected request");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<TaskError> for AuthError {
    fn from(err: TaskError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!(reason = %err, "Access token rejected");
        AuthError::Unauthorized
    }
}
