//! Change Username Use Case

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::repository::{AccountLookup, AccountRepository};
use crate::domain::value_object::{AccountId, Username};
use crate::error::{AuthError, AuthResult, IdentityField};

pub struct ChangeUsernameUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> ChangeUsernameUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, account_id: AccountId, username: &str) -> AuthResult<Username> {
        self.execute_at(account_id, username, Utc::now()).await
    }

    /// Renaming to a different casing of one's own name is allowed.
    pub async fn execute_at(
        &self,
        account_id: AccountId,
        username: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Username> {
        let username = Username::new(username)?;

        let holder = self
            .repo
            .find(&AccountLookup::Username(username.clone()))
            .await?;
        if holder.is_some_and(|other| other.id != account_id) {
            return Err(AuthError::DuplicateIdentity(IdentityField::Username));
        }

        let renamed = username.clone();
        self.repo
            .update_locked(&AccountLookup::Id(account_id), move |account| {
                account.rename(renamed, now);
                Ok(())
            })
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        tracing::info!(account_id = %account_id, "Username changed");
        Ok(username)
    }
}
