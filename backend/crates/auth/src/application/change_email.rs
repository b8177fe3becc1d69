//! Change Email Use Case
//!
//! The new address is taken as-is; verification status is unchanged.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::repository::{AccountLookup, AccountRepository};
use crate::domain::value_object::{AccountId, Email};
use crate::error::{AuthError, AuthResult, IdentityField};

pub struct ChangeEmailUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> ChangeEmailUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, account_id: AccountId, email: &str) -> AuthResult<Email> {
        self.execute_at(account_id, email, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        account_id: AccountId,
        email: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Email> {
        let email = Email::new(email)?;

        let holder = self.repo.find(&AccountLookup::Email(email.clone())).await?;
        if holder.is_some_and(|other| other.id != account_id) {
            return Err(AuthError::DuplicateIdentity(IdentityField::Email));
        }

        let updated = email.clone();
        self.repo
            .update_locked(&AccountLookup::Id(account_id), move |account| {
                account.change_email(updated, now);
                Ok(())
            })
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        tracing::info!(account_id = %account_id, "Email changed");
        Ok(email)
    }
}
