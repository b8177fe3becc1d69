//! Reset Password Use Case
//!
//! The recovery key stands in for the old password. It stays valid after
//! use.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::error::app_error::AppError;

use crate::application::config::AuthConfig;
use crate::domain::repository::{AccountLookup, AccountRepository};
use crate::domain::value_object::{RawPassword, RecoveryKey, UserPassword, Username};
use crate::error::{AuthError, AuthResult};

pub struct ResetPasswordInput {
    pub recovery_key: String,
    pub new_password: String,
}

pub struct ResetPasswordUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> ResetPasswordUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: ResetPasswordInput) -> AuthResult<Username> {
        self.execute_at(input, Utc::now()).await
    }

    /// Returns the username of the account whose password changed.
    pub async fn execute_at(
        &self,
        input: ResetPasswordInput,
        now: DateTime<Utc>,
    ) -> AuthResult<Username> {
        let key = RecoveryKey::from_input(&input.recovery_key);
        if key.as_str().is_empty() {
            return Err(AuthError::Validation(AppError::bad_request(
                "Recovery key is required",
            )));
        }

        let password = RawPassword::new(input.new_password)?;
        let password_hash = UserPassword::from_raw(&password, self.config.pepper())?;

        let (account_id, username) = self
            .repo
            .update_locked(&AccountLookup::RecoveryKey(key.digest()), |account| {
                account.change_password(password_hash, now);
                Ok((account.id, account.username.clone()))
            })
            .await?
            .ok_or(AuthError::InvalidRecoveryKey)?;

        tracing::info!(account_id = %account_id, "Password reset with recovery key");
        Ok(username)
    }
}
