//! Verify Email Use Case

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::error::app_error::AppError;

use crate::domain::repository::{AccountLookup, AccountRepository};
use crate::error::{AuthError, AuthResult};

pub struct VerifyEmailUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> VerifyEmailUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, token: &str) -> AuthResult<()> {
        self.execute_at(token, Utc::now()).await
    }

    /// Unknown, already-consumed and superseded tokens are all
    /// `TokenNotFound`. An expired token changes nothing.
    pub async fn execute_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Validation(
                AppError::bad_request("Verification token is required")
                    .with_action("Open the link from your verification email"),
            ));
        }

        let account_id = self
            .repo
            .update_locked(
                &AccountLookup::VerificationToken(token.to_string()),
                |account| {
                    account.verify(now)?;
                    Ok(account.id)
                },
            )
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        tracing::info!(account_id = %account_id, "Email verified");
        Ok(())
    }
}
