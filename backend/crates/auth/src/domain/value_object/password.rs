//! Password Value Objects
//!
//! Domain wrappers over `platform::password`. [`RawPassword`] is user input,
//! [`UserPassword`] is what gets stored.

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;
use std::sync::OnceLock;

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Clear text from a request body. Zeroized on drop.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// New password chosen by the user: must satisfy the password policy.
    pub fn new(raw: String) -> AppResult<Self> {
        ClearTextPassword::new(raw)
            .map(Self)
            .map_err(|e| match e {
                PasswordPolicyError::TooShort { min, .. } => {
                    AppError::bad_request(format!("Password must be at least {min} characters"))
                        .with_action("Please choose a longer password")
                }
                PasswordPolicyError::TooLong { max, .. } => {
                    AppError::bad_request(format!("Password must be at most {max} characters"))
                        .with_action("Please choose a shorter password")
                }
                PasswordPolicyError::EmptyOrWhitespace => {
                    AppError::bad_request("Password cannot be empty")
                        .with_action("Please enter a password")
                }
                PasswordPolicyError::InvalidCharacter => {
                    AppError::bad_request("Password contains invalid characters")
                        .with_action("Please remove any control characters")
                }
                PasswordPolicyError::CommonPattern => {
                    AppError::bad_request("Password is too common or follows a predictable pattern")
                        .with_action("Please choose a more unique password")
                }
            })
    }

    /// Login attempt. No policy: a password that predates a policy change
    /// must still be checkable against its hash.
    pub fn attempt(raw: String) -> Self {
        Self(ClearTextPassword::unchecked(raw))
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed)
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

/// Hash of a random throwaway password, built on first use.
static DECOY: OnceLock<Option<UserPassword>> = OnceLock::new();

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AppResult<Self> {
        raw.0
            .hash(pepper)
            .map(Self)
            .map_err(|e| AppError::internal("Failed to hash password").with_source(e))
    }

    pub fn from_db(phc: impl Into<String>) -> AppResult<Self> {
        HashedPassword::from_phc_string(phc)
            .map(Self)
            .map_err(|e| AppError::internal("Stored password hash is corrupt").with_source(e))
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(&raw.0, pepper)
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Spends one verification's worth of Argon2 work against a hash no
    /// attempt can match. Sign-in calls this when the identifier resolves
    /// to no account, so both failures take as long.
    pub fn verify_decoy(raw: &RawPassword, pepper: Option<&[u8]>) {
        let decoy = DECOY.get_or_init(|| {
            let throwaway = platform::crypto::random_hex(32).ok()?;
            Self::from_raw(&RawPassword::attempt(throwaway), None).ok()
        });
        match decoy {
            Some(decoy) => {
                decoy.verify(raw, pepper);
            }
            None => tracing::warn!("Decoy password hash unavailable"),
        }
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserPassword").field(&"[HASH]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_errors_become_bad_requests() {
        let err = RawPassword::new("short".into()).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("at least 8"));
    }

    #[test]
    fn attempt_skips_policy_but_verifies() {
        let stored = UserPassword::from_raw(&RawPassword::new("pw12345678".into()).unwrap(), None)
            .unwrap();
        assert!(stored.verify(&RawPassword::attempt("pw12345678".into()), None));
        assert!(!stored.verify(&RawPassword::attempt("short".into()), None));
    }

    #[test]
    fn decoy_is_built_once_and_rejects_everything() {
        UserPassword::verify_decoy(&RawPassword::attempt("pw12345678".into()), None);
        let decoy = DECOY.get().and_then(Option::as_ref).unwrap().clone();
        assert!(decoy.as_phc_string().starts_with("$argon2id$"));
        assert!(!decoy.verify(&RawPassword::attempt("pw12345678".into()), None));

        UserPassword::verify_decoy(&RawPassword::attempt("other".into()), Some(&b"pepper"[..]));
        assert_eq!(DECOY.get().and_then(Option::as_ref), Some(&decoy));
    }

    #[test]
    fn from_db_rejects_garbage() {
        assert!(UserPassword::from_db("plaintext").is_err());
    }
}
