//! Register Use Case
//!
//! Creates an unverified account, hands back the recovery key once, and
//! queues the verification email.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::application::notification::VerificationMailer;
use crate::application::token_issuer::{OPAQUE_TOKEN_BYTES, issue_opaque_token};
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    AccountId, Email, RawPassword, RecoveryKey, UserPassword, Username, VerificationToken,
};
use crate::error::{AuthError, AuthResult, IdentityField};

pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct RegisterOutput {
    pub account_id: AccountId,
    /// Clear recovery key. Not stored anywhere; this is the only copy.
    pub recovery_key: RecoveryKey,
}

pub struct RegisterUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    mailer: VerificationMailer,
}

impl<R> RegisterUseCase<R>
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

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        self.execute_at(input, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        input: RegisterInput,
        now: DateTime<Utc>,
    ) -> AuthResult<RegisterOutput> {
        let username = Username::new(&input.username)?;
        let email = Email::new(&input.email)?;
        let password = RawPassword::new(input.password)?;

        if self.repo.exists_by_username(&username).await? {
            return Err(AuthError::DuplicateIdentity(IdentityField::Username));
        }
        if self.repo.exists_by_email(&email).await? {
            return Err(AuthError::DuplicateIdentity(IdentityField::Email));
        }

        let password_hash = UserPassword::from_raw(&password, self.config.pepper())?;
        let recovery_key = RecoveryKey::new(issue_opaque_token(OPAQUE_TOKEN_BYTES)?);
        let token = VerificationToken::new(issue_opaque_token(OPAQUE_TOKEN_BYTES)?);

        let account = Account::register(
            username,
            email,
            password_hash,
            recovery_key.digest(),
            token.clone(),
            &self.config.verification,
            now,
        );

        // Unique indexes still catch a concurrent registration that slipped
        // past the checks above.
        self.repo.create(&account).await?;

        self.mailer
            .send_welcome(&account.email, &account.username, &token, &recovery_key);

        tracing::info!(account_id = %account.id, "Account registered");

        Ok(RegisterOutput {
            account_id: account.id,
            recovery_key,
        })
    }
}
