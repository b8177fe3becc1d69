//! Journal Error Types
//!
//! Post-specific error variants that render through the unified
//! `kernel::error::AppError` problem body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::scope::ScopeError;
use thiserror::Error;

pub type JournalResult<T> = Result<T, JournalError>;

/// SQLSTATE raised when a write fails a row-security `WITH CHECK`.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("{}", .0.message())]
    Validation(AppError),

    /// Absent, or owned by someone else and therefore invisible
    #[error("Post not found")]
    PostNotFound,

    #[error("You do not own this post")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl JournalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JournalError::Validation(e) => e.kind(),
            JournalError::PostNotFound => ErrorKind::NotFound,
            JournalError::Forbidden => ErrorKind::Forbidden,
            JournalError::Database(_) | JournalError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            JournalError::Validation(e) => {
                let err = AppError::new(e.kind(), e.message().to_string());
                match e.action() {
                    Some(action) => err.with_action(action.to_string()),
                    None => err,
                }
            }
            JournalError::Database(_) | JournalError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            JournalError::Database(e) => {
                tracing::error!(error = %e, "Journal database error");
            }
            JournalError::Internal(msg) => {
                tracing::error!(message = %msg, "Journal internal error");
            }
            JournalError::Forbidden => {
                tracing::warn!("Write attempted on a post owned by another account");
            }
            _ => {
                tracing::debug!(error = %self, "Journal error");
            }
        }
    }
}

impl IntoResponse for JournalError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for JournalError {
    fn from(err: AppError) -> Self {
        if err.kind() == ErrorKind::BadRequest {
            JournalError::Validation(err)
        } else {
            JournalError::Internal(err.to_string())
        }
    }
}

impl From<sqlx::Error> for JournalError {
    fn from(err: sqlx::Error) -> Self {
        let rls_violation = matches!(
            &err,
            sqlx::Error::Database(db) if db.code().as_deref() == Some(INSUFFICIENT_PRIVILEGE)
        );
        if rls_violation {
            JournalError::Forbidden
        } else {
            JournalError::Database(err)
        }
    }
}

impl From<ScopeError> for JournalError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::Database(e) => e.into(),
            ScopeError::Closed => JournalError::Internal(err.to_string()),
        }
    }
}
