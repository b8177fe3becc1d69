//! In-memory account repository.
//!
//! Same contract as the Postgres repository, including uniqueness of
//! canonical username and email. Used by tests and by local runs without
//! a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::entity::account::{Account, Verification};
use crate::domain::repository::{AccountLookup, AccountRepository};
use crate::domain::value_object::{AccountId, Email, Username};
use crate::error::{AuthError, AuthResult, IdentityField};

#[derive(Clone, Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<Mutex<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored account.
    pub fn accounts(&self) -> Vec<Account> {
        self.lock()
            .map(|accounts| accounts.values().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> AuthResult<MutexGuard<'_, HashMap<AccountId, Account>>> {
        self.accounts
            .lock()
            .map_err(|_| AuthError::Internal("account store lock poisoned".to_string()))
    }
}

fn matches(account: &Account, lookup: &AccountLookup) -> bool {
    match lookup {
        AccountLookup::Id(id) => account.id == *id,
        AccountLookup::Email(email) => account.email == *email,
        AccountLookup::Username(username) => {
            account.username.canonical() == username.canonical()
        }
        AccountLookup::VerificationToken(token) => match &account.verification {
            Verification::Unverified { token: pending, .. } => pending.as_str() == token,
            Verification::Verified => false,
        },
        AccountLookup::RecoveryKey(hash) => account.recovery_key_hash == *hash,
    }
}

/// Rejects `candidate` if another account already holds its username or
/// email.
fn check_unique(
    accounts: &HashMap<AccountId, Account>,
    candidate: &Account,
) -> AuthResult<()> {
    for other in accounts.values().filter(|other| other.id != candidate.id) {
        if other.username.canonical() == candidate.username.canonical() {
            return Err(AuthError::DuplicateIdentity(IdentityField::Username));
        }
        if other.email == candidate.email {
            return Err(AuthError::DuplicateIdentity(IdentityField::Email));
        }
    }
    Ok(())
}

impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        let mut accounts = self.lock()?;
        check_unique(&accounts, account)?;
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find(&self, lookup: &AccountLookup) -> AuthResult<Option<Account>> {
        let accounts = self.lock()?;
        Ok(accounts
            .values()
            .find(|account| matches(account, lookup))
            .cloned())
    }

    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool> {
        let accounts = self.lock()?;
        Ok(accounts
            .values()
            .any(|account| account.username.canonical() == username.canonical()))
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let accounts = self.lock()?;
        Ok(accounts.values().any(|account| account.email == *email))
    }

    async fn update_locked<F, T>(&self, lookup: &AccountLookup, mutate: F) -> AuthResult<Option<T>>
    where
        F: FnOnce(&mut Account) -> AuthResult<T> + Send,
        T: Send,
    {
        let mut accounts = self.lock()?;

        let Some(mut account) = accounts
            .values()
            .find(|account| matches(account, lookup))
            .cloned()
        else {
            return Ok(None);
        };

        let output = mutate(&mut account)?;
        check_unique(&accounts, &account)?;
        accounts.insert(account.id, account);

        Ok(Some(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::account::VerificationPolicy;
    use crate::domain::value_object::{RawPassword, RecoveryKeyHash, UserPassword, VerificationToken};
    use chrono::Utc;

    fn account(username: &str, email: &str, token: &str) -> Account {
        Account::register(
            Username::new(username).unwrap(),
            Email::new(email).unwrap(),
            UserPassword::from_raw(&RawPassword::attempt("pw12345678".into()), None).unwrap(),
            RecoveryKeyHash::from_db(format!("hash-{username}")),
            VerificationToken::new(token.to_string()),
            &VerificationPolicy::default(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn create_rejects_case_insensitive_username_collision() {
        let repo = InMemoryAccountRepository::new();
        AccountRepository::create(&repo, &account("alice", "a@x.com", "t1"))
            .await
            .unwrap();

        let err = AccountRepository::create(&repo, &account("ALICE", "b@x.com", "t2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::DuplicateIdentity(IdentityField::Username)
        ));
    }

    #[tokio::test]
    async fn create_rejects_email_collision() {
        let repo = InMemoryAccountRepository::new();
        AccountRepository::create(&repo, &account("alice", "a@x.com", "t1"))
            .await
            .unwrap();

        let err = AccountRepository::create(&repo, &account("bob", "a@x.com", "t2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity(IdentityField::Email)));
    }

    #[tokio::test]
    async fn verified_accounts_are_not_found_by_token() {
        let repo = InMemoryAccountRepository::new();
        AccountRepository::create(&repo, &account("alice", "a@x.com", "t1"))
            .await
            .unwrap();

        let lookup = AccountLookup::VerificationToken("t1".to_string());
        let verified = AccountRepository::update_locked(&repo, &lookup, |account| {
            account.verify(Utc::now())?;
            Ok(())
        })
        .await
        .unwrap();
        assert!(verified.is_some());

        let again = AccountRepository::find(&repo, &lookup).await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn failed_mutation_is_not_persisted() {
        let repo = InMemoryAccountRepository::new();
        let original = account("alice", "a@x.com", "t1");
        AccountRepository::create(&repo, &original).await.unwrap();

        let result: AuthResult<Option<()>> = AccountRepository::update_locked(
            &repo,
            &AccountLookup::Id(original.id),
            |account| {
                account.rename(Username::new("mallory").unwrap(), Utc::now());
                Err(AuthError::QuotaExceeded)
            },
        )
        .await;
        assert!(matches!(result, Err(AuthError::QuotaExceeded)));

        let stored = repo.accounts();
        assert_eq!(stored[0].username.original(), "alice");
    }

    #[tokio::test]
    async fn update_that_steals_an_email_is_rejected() {
        let repo = InMemoryAccountRepository::new();
        let alice = account("alice", "a@x.com", "t1");
        AccountRepository::create(&repo, &alice).await.unwrap();
        AccountRepository::create(&repo, &account("bob", "b@x.com", "t2"))
            .await
            .unwrap();

        let err = AccountRepository::update_locked(&repo, &AccountLookup::Id(alice.id), |account| {
            account.change_email(Email::new("b@x.com").unwrap(), Utc::now());
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity(IdentityField::Email)));
    }
}
