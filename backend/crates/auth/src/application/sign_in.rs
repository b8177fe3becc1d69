//! Sign In Use Case
//!
//! Checks credentials and issues a signed session token.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::application::token_issuer::SessionTokenIssuer;
use crate::domain::repository::{AccountLookup, AccountRepository};
use crate::domain::value_object::{AccountId, RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub account_id: AccountId,
    /// Session token for cookie and bearer use
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct SignInUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    tokens: Arc<SessionTokenIssuer>,
}

impl<R> SignInUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>, tokens: Arc<SessionTokenIssuer>) -> Self {
        Self {
            repo,
            config,
            tokens,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        self.execute_at(input, Utc::now()).await
    }

    /// Unknown identifier, wrong password and unverified email all look
    /// the same to the caller.
    pub async fn execute_at(
        &self,
        input: SignInInput,
        now: DateTime<Utc>,
    ) -> AuthResult<SignInOutput> {
        let attempt = RawPassword::attempt(input.password);

        let account = match AccountLookup::from_identifier(input.identifier.trim()) {
            Some(lookup) => self.repo.find(&lookup).await?,
            None => None,
        };
        let Some(account) = account else {
            UserPassword::verify_decoy(&attempt, self.config.pepper());
            return Err(AuthError::InvalidCredentials);
        };

        if !account.password.verify(&attempt, self.config.pepper()) {
            tracing::debug!(account_id = %account.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        if !account.is_verified() {
            return Err(AuthError::EmailNotVerified);
        }

        let session = self.tokens.issue_at(account.id, now)?;

        tracing::info!(account_id = %account.id, "Signed in");

        Ok(SignInOutput {
            account_id: account.id,
            token: session.token,
            expires_at: session.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::domain::entity::account::{Account, VerificationPolicy};
    use crate::domain::value_object::{Email, RecoveryKeyHash, Username, VerificationToken};
    use crate::infra::memory::InMemoryAccountRepository;

    async fn use_case() -> SignInUseCase<InMemoryAccountRepository> {
        let repo = InMemoryAccountRepository::new();
        let account = Account::register(
            Username::new("alice").unwrap(),
            Email::new("alice@example.com").unwrap(),
            UserPassword::from_raw(&RawPassword::attempt("pw12345678".into()), None).unwrap(),
            RecoveryKeyHash::from_db("hash-alice".to_string()),
            VerificationToken::new("t1".to_string()),
            &VerificationPolicy::default(),
            Utc::now(),
        );
        AccountRepository::create(&repo, &account).await.unwrap();

        let config = Arc::new(AuthConfig::with_random_secret());
        let tokens = Arc::new(SessionTokenIssuer::from_config(&config));
        SignInUseCase::new(Arc::new(repo), config, tokens)
    }

    async fn timed(
        use_case: &SignInUseCase<InMemoryAccountRepository>,
        identifier: &str,
    ) -> Duration {
        let started = Instant::now();
        let result = use_case
            .execute(SignInInput {
                identifier: identifier.to_string(),
                password: "wrong-password".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)), "{identifier}");
        started.elapsed()
    }

    #[tokio::test]
    async fn unknown_identifier_costs_a_password_check() {
        let use_case = use_case().await;

        // First call builds the decoy hash; measure afterwards.
        timed(&use_case, "nobody").await;

        let known = timed(&use_case, "alice").await;
        let unknown = timed(&use_case, "nobody").await;
        let unparseable = timed(&use_case, "   ").await;

        // Without the decoy an unknown identifier answers in microseconds.
        assert!(unknown * 10 >= known, "unknown {unknown:?} vs known {known:?}");
        assert!(unparseable * 10 >= known, "unparseable {unparseable:?} vs known {known:?}");
    }
}
