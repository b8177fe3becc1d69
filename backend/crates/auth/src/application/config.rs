//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::fmt;

use chrono::TimeDelta;
use platform::config::{ConfigError, Env};
use platform::cookie::CookieConfig;
use platform::quota::QuotaWindow;

pub use crate::domain::entity::account::VerificationPolicy;
/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Cookie carrying the session token
    pub session_cookie_name: String,
    /// HS256 signing key. `None` is tolerated at startup; the first issue or
    /// verify call then fails with an internal error.
    pub session_secret: Option<Vec<u8>>,
    /// Session token lifetime
    pub session_ttl: TimeDelta,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Base URL of the frontend, used in verification links
    pub frontend_domain: String,
    pub verification: VerificationPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "token".to_string(),
            session_secret: None,
            session_ttl: TimeDelta::hours(24),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            frontend_domain: "http://localhost:5173".to_string(),
            verification: VerificationPolicy::default(),
        }
    }
}

impl AuthConfig {
    /// Random 32-byte signing key (for development and tests)
    pub fn with_random_secret() -> Self {
        Self {
            session_secret: platform::crypto::try_random_bytes(32).ok(),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Reads `JWT_SECRET`, `SESSION_TTL_SECS`, `FE_DOMAIN`, `COOKIE_SECURE`,
    /// `COOKIE_SAME_SITE`, `PASSWORD_PEPPER`, `VERIFICATION_TTL_SECS`,
    /// `VERIFICATION_RESEND_LIMIT` and `VERIFICATION_COOLDOWN_SECS`.
    pub fn from_env(env: &Env) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let session_secret = env.get("JWT_SECRET").map(String::into_bytes);
        if session_secret.is_none() {
            tracing::warn!("JWT_SECRET is not set; login and authenticated routes will fail");
        }

        let same_site = match env.get("COOKIE_SAME_SITE") {
            None => defaults.cookie_same_site,
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "COOKIE_SAME_SITE".to_string(),
                value: raw,
            })?,
        };

        let verification = VerificationPolicy {
            token_ttl: seconds(env, "VERIFICATION_TTL_SECS", defaults.verification.token_ttl)?,
            resend: QuotaWindow::new(
                env.parse_or("VERIFICATION_RESEND_LIMIT", defaults.verification.resend.limit)?,
                seconds(
                    env,
                    "VERIFICATION_COOLDOWN_SECS",
                    defaults.verification.resend.window,
                )?,
            ),
        };

        Ok(Self {
            session_secret,
            session_ttl: seconds(env, "SESSION_TTL_SECS", defaults.session_ttl)?,
            cookie_secure: env.flag_or("COOKIE_SECURE", !cfg!(debug_assertions))?,
            cookie_same_site: same_site,
            password_pepper: env.get("PASSWORD_PEPPER").map(String::into_bytes),
            frontend_domain: env
                .get("FE_DOMAIN")
                .map(|d| d.trim_end_matches('/').to_string())
                .unwrap_or(defaults.frontend_domain),
            verification,
            ..defaults
        })
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.session_ttl.num_seconds()),
        }
    }
}

/// A strictly positive duration in whole seconds.
fn seconds(env: &Env, key: &str, default: TimeDelta) -> Result<TimeDelta, ConfigError> {
    let secs: i64 = env.parse_or(key, default.num_seconds())?;
    TimeDelta::try_seconds(secs)
        .filter(|delta| *delta > TimeDelta::zero())
        .ok_or_else(|| ConfigError::Invalid {
            key: key.to_string(),
            value: secs.to_string(),
        })
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_cookie_name", &self.session_cookie_name)
            .field("session_secret", &self.session_secret.as_ref().map(|_| "[REDACTED]"))
            .field("session_ttl", &self.session_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_same_site", &self.cookie_same_site)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("frontend_domain", &self.frontend_domain)
            .field("verification", &self.verification)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = AuthConfig::default();
        assert_eq!(config.session_cookie_name, "token");
        assert_eq!(config.session_ttl, TimeDelta::hours(24));
        assert_eq!(config.verification.token_ttl, TimeDelta::minutes(15));
        assert_eq!(config.verification.resend.limit, 3);
        assert_eq!(config.verification.resend.window, TimeDelta::hours(24));
        assert!(config.session_secret.is_none());
    }

    #[test]
    fn from_env_reads_overrides() {
        let env = Env::from_pairs([
            ("JWT_SECRET", "s3cret"),
            ("FE_DOMAIN", "https://journal.example/"),
            ("SESSION_TTL_SECS", "3600"),
            ("COOKIE_SECURE", "false"),
            ("COOKIE_SAME_SITE", "strict"),
            ("VERIFICATION_RESEND_LIMIT", "5"),
        ]);
        let config = AuthConfig::from_env(&env).unwrap();
        assert_eq!(config.session_secret.as_deref(), Some(&b"s3cret"[..]));
        assert_eq!(config.frontend_domain, "https://journal.example");
        assert_eq!(config.session_ttl, TimeDelta::hours(1));
        assert!(!config.cookie_secure);
        assert_eq!(config.cookie_same_site, SameSite::Strict);
        assert_eq!(config.verification.resend.limit, 5);
        assert_eq!(config.verification.token_ttl, TimeDelta::minutes(15));
    }

    #[test]
    fn missing_secret_is_not_a_startup_error() {
        let config = AuthConfig::from_env(&Env::from_pairs::<_, &str, &str>([])).unwrap();
        assert!(config.session_secret.is_none());
    }

    #[test]
    fn bad_values_are_reported() {
        let env = Env::from_pairs([("COOKIE_SAME_SITE", "sideways")]);
        assert!(AuthConfig::from_env(&env).is_err());
    }

    #[test]
    fn durations_must_be_positive_and_in_range() {
        for key in [
            "SESSION_TTL_SECS",
            "VERIFICATION_TTL_SECS",
            "VERIFICATION_COOLDOWN_SECS",
        ] {
            for value in ["0", "-5", "9223372036854775807"] {
                let env = Env::from_pairs([(key, value)]);
                match AuthConfig::from_env(&env) {
                    Err(ConfigError::Invalid { key: k, value: v }) => {
                        assert_eq!(k, key);
                        assert_eq!(v, value);
                    }
                    other => panic!("{key}={value} gave {other:?}"),
                }
            }
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AuthConfig {
            session_secret: Some(b"topsecret".to_vec()),
            password_pepper: Some(b"pepper".to_vec()),
            ..AuthConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains(&format!("{:?}", b"topsecret".to_vec())));
        assert!(!rendered.contains(&format!("{:?}", b"pepper".to_vec())));
    }

    #[test]
    fn session_cookie_matches_ttl() {
        let cookie = AuthConfig::development().session_cookie();
        assert_eq!(cookie.name, "token");
        assert!(!cookie.secure);
        assert_eq!(cookie.max_age_secs, Some(86_400));
    }
}
