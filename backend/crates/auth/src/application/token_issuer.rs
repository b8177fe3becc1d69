//! Token Issuer
//!
//! Two kinds of token:
//! - opaque tokens: random hex, looked up by exact match
//!   (verification tokens, recovery keys)
//! - session tokens: compact HS256 JWS with `sub`, `iat` and `exp`,
//!   verifiable without touching the database

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use kernel::id::AccountId;
use platform::crypto::{EntropyError, random_hex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::config::AuthConfig;
use crate::error::{AuthError, UnauthenticatedReason};

/// Bytes of entropy in every opaque token.
pub const OPAQUE_TOKEN_BYTES: usize = 32;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// `byte_len` bytes from the OS CSPRNG, hex encoded.
pub fn issue_opaque_token(byte_len: usize) -> Result<String, EntropyError> {
    random_hex(byte_len)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("session signing secret is not configured")]
    SecretMissing,

    #[error("session token could not be signed")]
    Signing,

    #[error("token is not a compact JWS")]
    Malformed,

    #[error("token header names an unexpected algorithm")]
    UnexpectedAlgorithm,

    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token claims are malformed")]
    MalformedClaims,

    #[error("token has expired")]
    Expired,
}

impl TokenError {
    /// Errors raised while reading the header. A header that base64-decodes
    /// but does not deserialize names no algorithm `jsonwebtoken` knows.
    fn from_header(err: &JwtError) -> Self {
        match err.kind() {
            JwtErrorKind::Json(_) | JwtErrorKind::InvalidAlgorithmName => {
                Self::UnexpectedAlgorithm
            }
            _ => Self::Malformed,
        }
    }
}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err.kind() {
            JwtErrorKind::InvalidSignature => Self::InvalidSignature,
            JwtErrorKind::InvalidAlgorithm | JwtErrorKind::InvalidAlgorithmName => {
                Self::UnexpectedAlgorithm
            }
            JwtErrorKind::ExpiredSignature => Self::Expired,
            JwtErrorKind::Json(_) | JwtErrorKind::MissingRequiredClaim(_) => Self::MalformedClaims,
            _ => Self::Malformed,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        let reason = match err {
            TokenError::SecretMissing | TokenError::Signing => {
                return AuthError::Internal(err.to_string());
            }
            TokenError::Malformed => UnauthenticatedReason::MalformedToken,
            TokenError::UnexpectedAlgorithm => UnauthenticatedReason::UnexpectedAlgorithm,
            TokenError::InvalidSignature => UnauthenticatedReason::InvalidSignature,
            TokenError::MalformedClaims => UnauthenticatedReason::MalformedClaims,
            TokenError::Expired => UnauthenticatedReason::ExpiredToken,
        };
        AuthError::Unauthenticated(reason)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Signs and checks session tokens with one server-held secret.
#[derive(Clone)]
pub struct SessionTokenIssuer {
    keys: Option<Keys>,
    validation: Validation,
    ttl: TimeDelta,
}

impl SessionTokenIssuer {
    pub fn new(secret: Option<Vec<u8>>, ttl: TimeDelta) -> Self {
        let keys = secret.filter(|s| !s.is_empty()).map(|secret| Keys {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
        });

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Expiry is compared against the caller's clock in `verify_at`.
        validation.validate_exp = false;

        Self {
            keys,
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.session_secret.clone(), config.session_ttl)
    }

    fn keys(&self) -> Result<&Keys, TokenError> {
        self.keys.as_ref().ok_or(TokenError::SecretMissing)
    }

    pub fn issue(&self, account_id: AccountId) -> Result<IssuedSession, TokenError> {
        self.issue_at(account_id, Utc::now())
    }

    pub fn issue_at(
        &self,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, TokenError> {
        let keys = self.keys()?;

        let iat = now.timestamp();
        let exp = iat + self.ttl.num_seconds();
        let claims = Claims {
            sub: account_id.to_string(),
            iat,
            exp,
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &keys.encoding).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign session token");
            TokenError::Signing
        })?;

        Ok(IssuedSession {
            token,
            expires_at: DateTime::from_timestamp(exp, 0).unwrap_or(now + self.ttl),
        })
    }

    pub fn verify(&self, token: &str) -> Result<AccountId, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Checks, in order: structure, algorithm, signature, claims, expiry.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AccountId, TokenError> {
        let keys = self.keys()?;

        decode_header(token).map_err(|e| TokenError::from_header(&e))?;
        let claims = decode::<Claims>(token, &keys.decoding, &self.validation)?.claims;

        let account_id: AccountId = claims
            .sub
            .parse()
            .map_err(|_| TokenError::MalformedClaims)?;

        if now.timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(account_id)
    }
}

impl std::fmt::Debug for SessionTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenIssuer")
            .field("secret", &self.keys.as_ref().map(|_| "[REDACTED]"))
            .field("ttl", &self.ttl)
            .finish()
    }
}
