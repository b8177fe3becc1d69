//! Email Value Object
//!
//! Syntactic validation only. Ownership is proven through the verification
//! link.

use kernel::error::app_error::{AppError, AppResult};
use serde::Serialize;
use std::fmt;

/// RFC 5321 path limit
const EMAIL_MAX_LENGTH: usize = 254;

/// RFC 5321 local-part limit
const LOCAL_PART_MAX_LENGTH: usize = 64;

/// Lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Email(String);

impl Email {
    pub fn new(email: impl AsRef<str>) -> AppResult<Self> {
        let email = email.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(AppError::bad_request("Email cannot be empty")
                .with_action("Please enter your email address"));
        }

        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }

        if !Self::is_valid_format(&email) {
            return Err(AppError::bad_request("Invalid email format")
                .with_action("Please enter a valid email address"));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > LOCAL_PART_MAX_LENGTH || domain.contains('@') {
            return false;
        }
        if local.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return false;
        }

        if !domain.contains('.')
            || !domain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return false;
        }

        domain
            .split('.')
            .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'))
    }

    /// Stored value, already validated on the way in.
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert_eq!(Email::new(" A@X.com ").unwrap().as_str(), "a@x.com");
        assert!(Email::new("user.name@example.co.jp").is_ok());
        assert!(Email::new("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        for bad in [
            "",
            "userexample.com",
            "user@",
            "@example.com",
            "user@@example.com",
            "user@example",
            "user@exa mple.com",
            "user@-example.com",
            "user@example..com",
            "us er@example.com",
        ] {
            assert!(Email::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_email_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(Email::new(long).is_err());
    }
}
