//! Authenticate Use Case
//!
//! Resolves a presented session token to a live account.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::token_issuer::SessionTokenIssuer;
use crate::domain::entity::account::Account;
use crate::domain::repository::{AccountLookup, AccountRepository};
use crate::error::{AuthError, AuthResult, UnauthenticatedReason};

pub struct AuthenticateUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    tokens: Arc<SessionTokenIssuer>,
}

impl<R> AuthenticateUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<SessionTokenIssuer>) -> Self {
        Self { repo, tokens }
    }

    pub async fn execute(&self, credential: Option<&str>) -> AuthResult<Account> {
        self.execute_at(credential, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        credential: Option<&str>,
        now: DateTime<Utc>,
    ) -> AuthResult<Account> {
        let token = credential
            .ok_or(AuthError::Unauthenticated(UnauthenticatedReason::MissingCredential))?;

        let account_id = self.tokens.verify_at(token, now)?;

        self.repo
            .find(&AccountLookup::Id(account_id))
            .await?
            .ok_or(AuthError::Unauthenticated(
                UnauthenticatedReason::AccountNotFound,
            ))
    }
}
