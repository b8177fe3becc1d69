//! Verification emails.
//!
//! Submission is fire-and-forget: the message goes onto the [`MailQueue`]
//! and the request carries on. A queue that refuses the message is logged,
//! never surfaced to the caller.

use platform::mail::{MailQueue, OutgoingEmail};

use crate::application::config::AuthConfig;
use crate::domain::value_object::{Email, RecoveryKey, Username, VerificationToken};

#[derive(Clone, Debug)]
pub struct VerificationMailer {
    queue: MailQueue,
    frontend_domain: String,
    token_ttl_minutes: i64,
}

impl VerificationMailer {
    pub fn new(queue: MailQueue, config: &AuthConfig) -> Self {
        Self {
            queue,
            frontend_domain: config.frontend_domain.clone(),
            token_ttl_minutes: config.verification.token_ttl.num_minutes(),
        }
    }

    pub fn verification_link(&self, token: &VerificationToken) -> String {
        format!(
            "{}/verify?token={}",
            self.frontend_domain.trim_end_matches('/'),
            token.as_str()
        )
    }

    /// First email: link plus the recovery key, which is never sent again.
    pub fn send_welcome(
        &self,
        to: &Email,
        username: &Username,
        token: &VerificationToken,
        recovery_key: &RecoveryKey,
    ) {
        let body = format!(
            "Hi {username},\n\n\
             Confirm your email address by opening this link within {ttl} minutes:\n\
             {link}\n\n\
             Your recovery key is:\n\
             {key}\n\n\
             Store it somewhere safe. It is the only way to reset your password \
             and it will not be shown again.\n",
            ttl = self.token_ttl_minutes,
            link = self.verification_link(token),
            key = recovery_key.as_str(),
        );
        self.submit(to, "Verify your email address", body);
    }

    pub fn send_reissue(&self, to: &Email, username: &Username, token: &VerificationToken) {
        let body = format!(
            "Hi {username},\n\n\
             Here is a new verification link. It is valid for {ttl} minutes:\n\
             {link}\n\n\
             Earlier links no longer work.\n",
            ttl = self.token_ttl_minutes,
            link = self.verification_link(token),
        );
        self.submit(to, "Your new verification link", body);
    }

    fn submit(&self, to: &Email, subject: &str, body: String) {
        let email = OutgoingEmail {
            to: to.as_str().to_string(),
            subject: subject.to_string(),
            body,
        };
        if let Err(e) = self.queue.submit(email) {
            tracing::error!(to = %to, error = %e, "Failed to queue verification email");
        }
    }
}
