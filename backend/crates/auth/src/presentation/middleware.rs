//! Auth Middleware
//!
//! Resolves the request's bearer credential to an account and exposes it
//! to handlers as [`CurrentAccount`].

use std::sync::Arc;

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::cookie::extract_credential;

use crate::application::AuthenticateUseCase;
use crate::application::config::AuthConfig;
use crate::application::token_issuer::SessionTokenIssuer;
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::AccountId;
use crate::error::{AuthError, UnauthenticatedReason};

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState<R>
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<SessionTokenIssuer>,
}

/// The authenticated account, placed in request extensions by
/// [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub id: AccountId,
    pub account: Account,
}

/// Middleware that requires a valid session token
pub async fn require_auth<R>(
    state: AuthMiddlewareState<R>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: AccountRepository + Clone + Send + Sync + 'static,
{
    let credential = extract_credential(req.headers(), &state.config.session_cookie_name);

    let use_case = AuthenticateUseCase::new(state.repo.clone(), state.tokens.clone());
    let account = match use_case.execute(credential.as_deref()).await {
        Ok(account) => account,
        Err(e) => return e.into_response(),
    };

    req.extensions_mut().insert(CurrentAccount {
        id: account.id,
        account,
    });

    next.run(req).await
}

impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAccount>()
            .cloned()
            .ok_or(AuthError::Unauthenticated(
                UnauthenticatedReason::MissingIdentity,
            ))
    }
}
