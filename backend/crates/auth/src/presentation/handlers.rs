//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use platform::mail::MailQueue;

use crate::application::config::AuthConfig;
use crate::application::token_issuer::SessionTokenIssuer;
use crate::application::{
    ChangeEmailUseCase, ChangeUsernameUseCase, RegisterInput, RegisterUseCase,
    ResendVerificationUseCase, ResetPasswordInput, ResetPasswordUseCase, SignInInput,
    SignInUseCase, VerificationMailer, VerifyEmailUseCase,
};
use crate::domain::repository::AccountRepository;
use crate::error::AuthResult;
use crate::presentation::dto::{
    ChangeEmailRequest, ChangeUsernameRequest, LoginRequest, LoginResponse, MessageResponse,
    RegisterRequest, RegisterResponse, ResendVerificationRequest, ResendVerificationResponse,
    ResetPasswordRequest, ResetPasswordResponse, UserResponse, VerifyQuery,
};
use crate::presentation::middleware::{AuthMiddlewareState, CurrentAccount};

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<SessionTokenIssuer>,
    pub mailer: VerificationMailer,
}

impl<R> AuthAppState<R>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, config: AuthConfig, queue: MailQueue) -> Self {
        let tokens = SessionTokenIssuer::from_config(&config);
        let mailer = VerificationMailer::new(queue, &config);
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            mailer,
        }
    }

    /// State for [`require_auth`](crate::presentation::middleware::require_auth),
    /// sharing this state's repository and signing key.
    pub fn middleware_state(&self) -> AuthMiddlewareState<R> {
        AuthMiddlewareState {
            repo: self.repo.clone(),
            config: self.config.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

// ============================================================================
// Registration & Verification
// ============================================================================

/// POST /api/register
pub async fn register<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.config.clone(),
        state.mailer.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account created. Check your email to verify your address.".to_string(),
            recovery_key: output.recovery_key.into_string(),
        }),
    ))
}

/// GET /api/verify?token=
pub async fn verify_email<R>(
    State(state): State<AuthAppState<R>>,
    Query(query): Query<VerifyQuery>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    VerifyEmailUseCase::new(state.repo.clone())
        .execute(&query.token)
        .await?;

    Ok(Json(MessageResponse::new("Email verified")))
}

/// POST /api/resend-verification
pub async fn resend_verification<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<ResendVerificationRequest>,
) -> AuthResult<Json<ResendVerificationResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    let use_case = ResendVerificationUseCase::new(
        state.repo.clone(),
        state.config.clone(),
        state.mailer.clone(),
    );

    let output = use_case.execute(&req.email).await?;

    Ok(Json(ResendVerificationResponse {
        message: "Verification email sent".to_string(),
        expires_at: output.expires_at,
        resend_count: output.resend_count,
        resend_limit: output.resend_limit,
        remaining_quota: output.remaining_quota,
    }))
}

// ============================================================================
// Session
// ============================================================================

/// POST /api/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.config.clone(),
        state.tokens.clone(),
    );

    let output = use_case
        .execute(SignInInput {
            identifier: req.identifier,
            password: req.password,
        })
        .await?;

    let mut response = Json(LoginResponse {
        token: output.token.clone(),
        expires_at: output.expires_at,
    })
    .into_response();

    if let Some(cookie) = state.config.session_cookie().set_cookie_header(&output.token) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }

    Ok(response)
}

/// POST /api/logout
///
/// Only clears the cookie. Issued tokens stay valid until they expire.
pub async fn logout<R>(State(state): State<AuthAppState<R>>) -> impl IntoResponse
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    let mut response = Json(MessageResponse::new("Logged out")).into_response();
    if let Some(cookie) = state.config.session_cookie().delete_cookie_header() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

// ============================================================================
// Recovery
// ============================================================================

/// POST /api/reset-password
pub async fn reset_password<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<Json<ResetPasswordResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    let use_case = ResetPasswordUseCase::new(state.repo.clone(), state.config.clone());

    let username = use_case
        .execute(ResetPasswordInput {
            recovery_key: req.recovery_key,
            new_password: req.new_password,
        })
        .await?;

    Ok(Json(ResetPasswordResponse {
        message: "Password updated".to_string(),
        username: username.original().to_string(),
    }))
}

// ============================================================================
// Account (requires authentication)
// ============================================================================

/// GET /api/user
pub async fn current_user(current: CurrentAccount) -> Json<UserResponse> {
    let account = current.account;
    Json(UserResponse {
        id: account.id.into_uuid(),
        username: account.username.original().to_string(),
        email: account.email.as_str().to_string(),
        is_verified: account.is_verified(),
    })
}

/// PUT /api/account/change-username
pub async fn change_username<R>(
    State(state): State<AuthAppState<R>>,
    current: CurrentAccount,
    Json(req): Json<ChangeUsernameRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    ChangeUsernameUseCase::new(state.repo.clone())
        .execute(current.id, &req.username)
        .await?;

    Ok(Json(MessageResponse::new("Username updated")))
}

/// PUT /api/account/change-email
pub async fn change_email<R>(
    State(state): State<AuthAppState<R>>,
    current: CurrentAccount,
    Json(req): Json<ChangeEmailRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    ChangeEmailUseCase::new(state.repo.clone())
        .execute(current.id, &req.email)
        .await?;

    Ok(Json(MessageResponse::new("Email updated")))
}
