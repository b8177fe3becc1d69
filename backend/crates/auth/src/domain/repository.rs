//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in `infra`.

use crate::domain::entity::account::Account;
use crate::domain::value_object::{AccountId, Email, RecoveryKeyHash, Username};
use crate::error::AuthResult;

/// How to find one live (not soft-deleted) account.
#[derive(Debug, Clone)]
pub enum AccountLookup {
    Id(AccountId),
    Email(Email),
    Username(Username),
    /// Exact match on the pending verification token
    VerificationToken(String),
    RecoveryKey(RecoveryKeyHash),
}

impl AccountLookup {
    /// Login identifier: an email if it contains `@`, a username otherwise.
    /// `None` when it cannot possibly match an account.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        if identifier.contains('@') {
            Email::new(identifier).ok().map(Self::Email)
        } else {
            Username::new(identifier).ok().map(Self::Username)
        }
    }
}

#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Insert a new account. Username or email collisions fail with
    /// `AuthError::DuplicateIdentity`.
    async fn create(&self, account: &Account) -> AuthResult<()>;

    async fn find(&self, lookup: &AccountLookup) -> AuthResult<Option<Account>>;

    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Locked read-modify-write.
    ///
    /// Locks the matching account, hands a copy to `mutate`, and persists
    /// the copy only if `mutate` returns `Ok`. No other `update_locked` on
    /// the same account interleaves. Returns `Ok(None)` when nothing
    /// matches.
    async fn update_locked<F, T>(&self, lookup: &AccountLookup, mutate: F) -> AuthResult<Option<T>>
    where
        F: FnOnce(&mut Account) -> AuthResult<T> + Send,
        T: Send;
}
