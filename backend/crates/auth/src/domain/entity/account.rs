//! Account Entity
//!
//! Credentials plus the email-verification state machine:
//!
//! ```text
//! register ──▶ Unverified { token, expires_at, resend_count }
//!                 │  reissue: new token, +1 resend (quota-limited)
//!                 │  verify (before expiry)
//!                 ▼
//!              Verified
//! ```
//!
//! All transitions take `now` explicitly.

use chrono::{DateTime, TimeDelta, Utc};
use platform::quota::{QuotaDecision, QuotaWindow};

use crate::domain::value_object::{
    AccountId, Email, RecoveryKeyHash, UserPassword, Username, VerificationToken,
};

/// Verification timing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Lifetime of each verification token
    pub token_ttl: TimeDelta,
    /// Resends allowed, and the idle period after which the count restarts
    pub resend: QuotaWindow,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            token_ttl: TimeDelta::minutes(15),
            resend: QuotaWindow::new(3, TimeDelta::hours(24)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Unverified {
        token: VerificationToken,
        expires_at: DateTime<Utc>,
        resend_count: u32,
    },
    Verified,
}

/// Rejected verification transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    AlreadyVerified,
    TokenExpired,
    QuotaExceeded,
}

/// Result of a successful resend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReissueReceipt {
    pub expires_at: DateTime<Utc>,
    pub resend_count: u32,
    pub remaining_quota: u32,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub username: Username,
    pub email: Email,
    pub password: UserPassword,
    pub recovery_key_hash: RecoveryKeyHash,
    pub verification: Verification,
    pub last_verification_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Fresh unverified account. The first verification email counts as a
    /// send but not as a resend.
    pub fn register(
        username: Username,
        email: Email,
        password: UserPassword,
        recovery_key_hash: RecoveryKeyHash,
        token: VerificationToken,
        policy: &VerificationPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            username,
            email,
            password,
            recovery_key_hash,
            verification: Verification::Unverified {
                token,
                expires_at: now + policy.token_ttl,
                resend_count: 0,
            },
            last_verification_sent_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.verification, Verification::Verified)
    }

    pub fn verification_token(&self) -> Option<&VerificationToken> {
        match &self.verification {
            Verification::Unverified { token, .. } => Some(token),
            Verification::Verified => None,
        }
    }

    /// Consumes the pending token. The token is valid up to and including
    /// its expiry instant.
    pub fn verify(&mut self, now: DateTime<Utc>) -> Result<(), VerificationError> {
        let expires_at = match &self.verification {
            Verification::Verified => return Err(VerificationError::AlreadyVerified),
            Verification::Unverified { expires_at, .. } => *expires_at,
        };
        if now > expires_at {
            return Err(VerificationError::TokenExpired);
        }
        self.verification = Verification::Verified;
        self.updated_at = now;
        Ok(())
    }

    /// Replaces the pending token.
    ///
    /// The resend counter restarts once more than the quota window has
    /// passed since the *current token's expiry*, not since the last send.
    pub fn reissue_verification(
        &mut self,
        token: VerificationToken,
        policy: &VerificationPolicy,
        now: DateTime<Utc>,
    ) -> Result<ReissueReceipt, VerificationError> {
        let Verification::Unverified {
            expires_at,
            resend_count,
            ..
        } = &self.verification
        else {
            return Err(VerificationError::AlreadyVerified);
        };

        let used = policy.resend.replenished(*resend_count, *expires_at, now);
        let QuotaDecision::Granted { used } = policy.resend.try_spend(used) else {
            return Err(VerificationError::QuotaExceeded);
        };

        let expires_at = now + policy.token_ttl;
        self.verification = Verification::Unverified {
            token,
            expires_at,
            resend_count: used,
        };
        self.last_verification_sent_at = Some(now);
        self.updated_at = now;

        Ok(ReissueReceipt {
            expires_at,
            resend_count: used,
            remaining_quota: policy.resend.remaining(used),
        })
    }

    pub fn change_password(&mut self, password: UserPassword, now: DateTime<Utc>) {
        self.password = password;
        self.updated_at = now;
    }

    pub fn rename(&mut self, username: Username, now: DateTime<Utc>) {
        self.username = username;
        self.updated_at = now;
    }

    pub fn change_email(&mut self, email: Email, now: DateTime<Utc>) {
        self.email = email;
        self.updated_at = now;
    }
}
