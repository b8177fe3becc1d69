//! Outbound email.
//!
//! [`EmailSender`] is the transport seam. [`MailQueue`] sits in front of a
//! sender so request handlers only enqueue: a single background worker
//! delivers messages in order, retrying each with exponential backoff, and
//! logs the ones it finally gives up on.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, Env};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mailbox `{0}`")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail queue is full")]
    QueueFull,

    #[error("mail queue is closed")]
    QueueClosed,
}

/// Plain-text message.
#[derive(Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

// Bodies carry one-time tokens.
impl fmt::Debug for OutgoingEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutgoingEmail")
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("body", &"[REDACTED]")
            .finish()
    }
}

#[trait_variant::make(EmailSender: Send)]
pub trait LocalEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

// ============================================================================
// SMTP
// ============================================================================

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl SmtpConfig {
    /// `None` unless `SMTP_HOST`, `EMAIL_FROM` and `EMAIL_PASSWORD` are all
    /// set. The sender address doubles as the SMTP login.
    pub fn from_env(env: &Env) -> Result<Option<Self>, ConfigError> {
        let (Some(host), Some(from), Some(password)) = (
            env.get("SMTP_HOST"),
            env.get("EMAIL_FROM"),
            env.get("EMAIL_PASSWORD"),
        ) else {
            return Ok(None);
        };
        Ok(Some(Self {
            host,
            port: env.parse_or("SMTP_PORT", 587)?,
            username: from.clone(),
            password,
            from,
        }))
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

/// STARTTLS relay.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| MailError::InvalidAddress(config.from.clone()))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self { transport, from })
    }
}

impl EmailSender for SmtpEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| MailError::InvalidAddress(email.to.clone()))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// Outbox
// ============================================================================

/// Keeps every message in memory instead of delivering it.
#[derive(Clone, Default)]
pub struct OutboxEmailSender {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl OutboxEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl EmailSender for OutboxEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email captured by outbox");
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("outbox lock poisoned".to_string()))?
            .push(email.clone());
        Ok(())
    }
}

// ============================================================================
// Dispatch queue
// ============================================================================

#[derive(Debug, Clone)]
pub struct MailQueueConfig {
    pub capacity: usize,
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub base_backoff: Duration,
}

impl Default for MailQueueConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl MailQueueConfig {
    fn backoff(&self, failed_attempts: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(failed_attempts.saturating_sub(1)))
    }
}

/// Handle for enqueueing email. Cheap to clone.
#[derive(Clone)]
pub struct MailQueue {
    tx: mpsc::Sender<OutgoingEmail>,
}

impl MailQueue {
    /// Spawns the delivery worker. The worker exits once every `MailQueue`
    /// clone is dropped and the backlog is drained.
    pub fn start<S>(sender: S, config: MailQueueConfig) -> (Self, JoinHandle<()>)
    where
        S: EmailSender + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let worker = tokio::spawn(run_worker(sender, rx, config));
        (Self { tx }, worker)
    }

    /// Never waits for capacity.
    pub fn submit(&self, email: OutgoingEmail) -> Result<(), MailError> {
        self.tx.try_send(email).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => MailError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => MailError::QueueClosed,
        })
    }
}

impl fmt::Debug for MailQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailQueue")
            .field("capacity", &self.tx.max_capacity())
            .finish()
    }
}

async fn run_worker<S>(sender: S, mut rx: mpsc::Receiver<OutgoingEmail>, config: MailQueueConfig)
where
    S: EmailSender + Sync,
{
    while let Some(email) = rx.recv().await {
        deliver(&sender, &email, &config).await;
    }
    tracing::debug!("Mail queue closed, worker exiting");
}

async fn deliver<S>(sender: &S, email: &OutgoingEmail, config: &MailQueueConfig) -> bool
where
    S: EmailSender + Sync,
{
    let mut attempt = 1;
    loop {
        match sender.send(email).await {
            Ok(()) => {
                tracing::debug!(to = %email.to, attempt, "Email delivered");
                return true;
            }
            Err(err) if attempt < config.max_attempts => {
                let delay = config.backoff(attempt);
                tracing::warn!(
                    to = %email.to,
                    attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %err,
                    "Email delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(
                    to = %email.to,
                    subject = %email.subject,
                    attempts = attempt,
                    error = %err,
                    "Giving up on email delivery"
                );
                return false;
            }
        }
    }
}
