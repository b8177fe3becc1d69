//! Password Hashing and Verification
//!
//! NIST SP 800-63B style password handling:
//! - NFKC normalization before any check
//! - length bounds counted in code points
//! - a small deny-list of predictable patterns
//! - Argon2id hashing with an optional application pepper
//! - zeroization of clear text on drop

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// NIST: SHALL be at least 8
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// NIST: SHOULD permit at least 64
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Validated clear text password.
///
/// Not `Clone`, redacted in `Debug`, wiped on drop.
///
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// let password = ClearTextPassword::new("pw12345678".to_string()).unwrap();
/// let hashed = password.hash(None).unwrap();
/// assert!(hashed.verify(&password, None));
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let mut raw = raw;
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        if is_common_pattern(&normalized) {
            return Err(PasswordPolicyError::CommonPattern);
        }

        Ok(Self(normalized))
    }

    /// Skips the policy. Used when checking a login attempt, where the
    /// stored hash is the only authority.
    pub fn unchecked(raw: String) -> Self {
        let mut raw = raw;
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(self.0.as_bytes().to_vec());
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        bytes
    }

    /// Argon2id with default (OWASP) parameters and a fresh 16-byte salt.
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(&self.peppered(pepper), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Constant-time inside argon2.
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(&password.peppered(pepper), &parsed_hash)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn is_common_pattern(password: &str) -> bool {
    let lower = password.to_lowercase();

    // "aaaaaaaa"
    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    if is_sequential_digits(&lower) {
        return true;
    }

    const KEYBOARD_PATTERNS: &[&str] = &["qwerty", "asdfgh", "zxcvbn", "qazwsx", "1qaz2wsx"];
    if KEYBOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "abcdefgh",
        "letmein1",
        "welcome1",
        "admin123",
        "iloveyou",
        "sunshine",
        "princess",
        "football",
        "baseball",
        "trustno1",
    ];
    COMMON_PASSWORDS.contains(&lower.as_str())
}

/// All digits and strictly ascending or descending ("12345678", "9876543210").
/// Digits mixed with letters are left to the length rule.
fn is_sequential_digits(s: &str) -> bool {
    let Some(digits) = s
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<u32>>>()
    else {
        return false;
    };

    let ascending = digits
        .windows(2)
        .all(|w| w[1] == w[0] + 1 || (w[0] == 9 && w[1] == 0));
    let descending = digits
        .windows(2)
        .all(|w| w[0] == w[1] + 1 || (w[0] == 0 && w[1] == 9));

    ascending || descending
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_bounds() {
        assert!(matches!(
            ClearTextPassword::new("short".to_string()),
            Err(PasswordPolicyError::TooShort { min: 8, actual: 5 })
        ));
        assert!(matches!(
            ClearTextPassword::new("a1".repeat(MAX_PASSWORD_LENGTH)),
            Err(PasswordPolicyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_password_whitespace_only() {
        assert_eq!(
            ClearTextPassword::new("        ".to_string()).unwrap_err(),
            PasswordPolicyError::EmptyOrWhitespace
        );
    }

    #[test]
    fn test_password_control_character() {
        assert_eq!(
            ClearTextPassword::new("abc\u{7}defgh".to_string()).unwrap_err(),
            PasswordPolicyError::InvalidCharacter
        );
    }

    #[test]
    fn test_password_common_pattern() {
        for weak in ["password123", "qwertyuiop", "12345678", "98765432", "zzzzzzzzzz"] {
            assert_eq!(
                ClearTextPassword::new(weak.to_string()).unwrap_err(),
                PasswordPolicyError::CommonPattern,
                "{weak}"
            );
        }
    }

    #[test]
    fn test_digits_with_prefix_are_accepted() {
        assert!(ClearTextPassword::new("pw12345678".to_string()).is_ok());
        assert!(ClearTextPassword::new("MySecure#Pass2024!".to_string()).is_ok());
        assert!(ClearTextPassword::new("パスワード安全です!".to_string()).is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let password = ClearTextPassword::unchecked("TestPassword123!".to_string());
        let hashed = password.hash(None).unwrap();
        assert!(hashed.as_phc_string().starts_with("$argon2id$"));

        assert!(hashed.verify(&password, None));
        let wrong = ClearTextPassword::unchecked("WrongPassword123!".to_string());
        assert!(!hashed.verify(&wrong, None));
    }

    #[test]
    fn test_hash_with_pepper() {
        let password = ClearTextPassword::unchecked("TestPassword123!".to_string());
        let pepper = b"my_secret_pepper";
        let hashed = password.hash(Some(pepper)).unwrap();

        assert!(hashed.verify(&password, Some(pepper)));
        assert!(!hashed.verify(&password, None));
        assert!(!hashed.verify(&password, Some(b"wrong_pepper")));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let password = ClearTextPassword::unchecked("TestPassword123!".to_string());
        let hashed = password.hash(None).unwrap();

        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&password, None));
        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::unchecked("secret".to_string());
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));
    }
}
