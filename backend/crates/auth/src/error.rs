//! Auth Error Types
//!
//! Auth-specific error variants that render through the unified
//! `kernel::error::AppError` problem body.

use std::fmt;

use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::crypto::EntropyError;
use platform::scope::ScopeError;
use thiserror::Error;

use crate::domain::entity::account::VerificationError;

pub type AuthResult<T> = Result<T, AuthError>;

/// Response header set on every 401 produced by this crate.
pub const AUTH_REQUIRED_HEADER: &str = "x-auth-required";

/// Why a request could not be tied to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    MissingCredential,
    MalformedToken,
    UnexpectedAlgorithm,
    InvalidSignature,
    ExpiredToken,
    MalformedClaims,
    AccountNotFound,
    /// The scope layer ran without the authentication layer in front of it.
    MissingIdentity,
}

impl UnauthenticatedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::MalformedToken => "malformed_token",
            Self::UnexpectedAlgorithm => "unexpected_algorithm",
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredToken => "expired",
            Self::MalformedClaims => "malformed_claims",
            Self::AccountNotFound => "account_not_found",
            Self::MissingIdentity => "missing_identity",
        }
    }
}

impl fmt::Display for UnauthenticatedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which unique attribute collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Username,
    Email,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdentityField::Username => "Username",
            IdentityField::Email => "Email",
        })
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Input rejected by a value object
    #[error("{}", .0.message())]
    Validation(AppError),

    #[error("{0} is already taken")]
    DuplicateIdentity(IdentityField),

    /// Unknown identifier or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Correct password, unverified email. Rendered exactly like
    /// `InvalidCredentials`.
    #[error("Invalid credentials")]
    EmailNotVerified,

    #[error("Invalid verification token")]
    TokenNotFound,

    #[error("Verification token has expired")]
    TokenExpired,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Verification email limit reached")]
    QuotaExceeded,

    #[error("Invalid recovery key")]
    InvalidRecoveryKey,

    #[error("Authentication required: {0}")]
    Unauthenticated(UnauthenticatedReason),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(e) => e.kind(),
            AuthError::DuplicateIdentity(_) => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::EmailNotVerified
            | AuthError::Unauthenticated(_) => ErrorKind::Unauthorized,
            AuthError::TokenNotFound
            | AuthError::AccountNotFound
            | AuthError::InvalidRecoveryKey => ErrorKind::NotFound,
            AuthError::TokenExpired | AuthError::AlreadyVerified => ErrorKind::BadRequest,
            AuthError::QuotaExceeded => ErrorKind::TooManyRequests,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Client-facing form. Server errors never leak their cause.
    pub fn to_app_error(&self) -> AppError {
        let err = match self {
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        };
        match self.action() {
            Some(action) => err.with_action(action.to_string()),
            None => err,
        }
    }

    fn action(&self) -> Option<&str> {
        match self {
            AuthError::Validation(e) => e.action(),
            AuthError::TokenExpired => Some("Request a new verification email"),
            AuthError::QuotaExceeded => Some("Please try again later"),
            AuthError::Unauthenticated(_) => Some("Please log in"),
            _ => None,
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::EmailNotVerified => {
                tracing::info!("Login attempt on unverified account");
            }
            AuthError::QuotaExceeded => {
                tracing::warn!("Verification resend quota exhausted");
            }
            AuthError::Unauthenticated(reason) => {
                tracing::debug!(reason = %reason, "Request not authenticated");
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
        let mut response = self.to_app_error().into_response();
        if matches!(self, AuthError::Unauthenticated(_)) {
            response
                .headers_mut()
                .insert(AUTH_REQUIRED_HEADER, HeaderValue::from_static("true"));
        }
        response
    }
}

/// Value objects report bad input as 400s; anything else they return is a
/// server fault.
impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.kind() == ErrorKind::BadRequest {
            AuthError::Validation(err)
        } else {
            AuthError::Internal(err.to_string())
        }
    }
}

impl From<VerificationError> for AuthError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::AlreadyVerified => AuthError::AlreadyVerified,
            VerificationError::TokenExpired => AuthError::TokenExpired,
            VerificationError::QuotaExceeded => AuthError::QuotaExceeded,
        }
    }
}

impl From<EntropyError> for AuthError {
    fn from(err: EntropyError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<ScopeError> for AuthError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::Database(e) => AuthError::Database(e),
            ScopeError::Closed => AuthError::Internal(err.to_string()),
        }
    }
}
