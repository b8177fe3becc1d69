//! One-time secrets handed to the account holder.
//!
//! Both are 32 random bytes rendered as 64 lowercase hex chars. The
//! verification token is stored as issued and matched exactly. The recovery
//! key is only ever stored as its SHA-256 digest.

use platform::crypto::sha256_hex;
use std::fmt;

fn redacted(value: &str) -> String {
    format!("{}…", value.get(..6).unwrap_or(""))
}

#[derive(Clone, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    pub fn new(issued: String) -> Self {
        Self(issued)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VerificationToken")
            .field(&redacted(&self.0))
            .finish()
    }
}

/// Clear recovery key, shown once and then dropped.
pub struct RecoveryKey(String);

impl RecoveryKey {
    pub fn new(issued: String) -> Self {
        Self(issued)
    }

    /// Normalizes user input (surrounding space, letter case).
    pub fn from_input(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digest(&self) -> RecoveryKeyHash {
        RecoveryKeyHash(sha256_hex(self.0.as_bytes()))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for RecoveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecoveryKey").field(&"[REDACTED]").finish()
    }
}

/// Hex SHA-256 of a [`RecoveryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecoveryKeyHash(String);

impl RecoveryKeyHash {
    pub fn from_db(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_input_is_normalized() {
        let key = "ab".repeat(32);
        let issued = RecoveryKey::new(key.clone());
        let typed = RecoveryKey::from_input(&format!("  {}\n", key.to_uppercase()));
        assert_eq!(issued.digest(), typed.digest());
        assert_eq!(issued.digest().as_str().len(), 64);
        assert_ne!(issued.digest().as_str(), key);
    }

    #[test]
    fn debug_does_not_leak() {
        let token = VerificationToken::new("deadbeefcafebabe".into());
        assert!(!format!("{token:?}").contains("cafebabe"));
        let key = RecoveryKey::new("deadbeefcafebabe".into());
        assert!(!format!("{key:?}").contains("dead"));
    }
}
