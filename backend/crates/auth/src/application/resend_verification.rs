//! Resend Verification Use Case
//!
//! Rotates the pending token under a row lock so two concurrent resends
//! cannot both pass the quota check.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::application::notification::VerificationMailer;
use crate::application::token_issuer::{OPAQUE_TOKEN_BYTES, issue_opaque_token};
use crate::domain::repository::{AccountLookup, AccountRepository};
use crate::domain::value_object::{Email, VerificationToken};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendVerificationOutput {
    pub expires_at: DateTime<Utc>,
    pub resend_count: u32,
    pub resend_limit: u32,
    pub remaining_quota: u32,
}

pub struct ResendVerificationUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    mailer: VerificationMailer,
}

impl<R> ResendVerificationUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>, mailer: VerificationMailer) -> Self {
        Self {
            repo,
            config,
            mailer,
        }
    }

    pub async fn execute(&self, email: &str) -> AuthResult<ResendVerificationOutput> {
        self.execute_at(email, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<ResendVerificationOutput> {
        let email = Email::new(email)?;
        let token = VerificationToken::new(issue_opaque_token(OPAQUE_TOKEN_BYTES)?);
        let policy = self.config.verification;

        let issued = token.clone();
        let (receipt, account_id, username) = self
            .repo
            .update_locked(&AccountLookup::Email(email.clone()), move |account| {
                let receipt = account.reissue_verification(issued, &policy, now)?;
                Ok((receipt, account.id, account.username.clone()))
            })
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        self.mailer.send_reissue(&email, &username, &token);

        tracing::info!(
            account_id = %account_id,
            resend_count = receipt.resend_count,
            "Verification email reissued"
        );

        Ok(ResendVerificationOutput {
            expires_at: receipt.expires_at,
            resend_count: receipt.resend_count,
            resend_limit: policy.resend.limit,
            remaining_quota: receipt.remaining_quota,
        })
    }
}
