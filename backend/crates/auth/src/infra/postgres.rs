//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::entity::account::{Account, Verification};
use crate::domain::repository::{AccountLookup, AccountRepository};
use crate::domain::value_object::{
    AccountId, Email, RecoveryKeyHash, UserPassword, Username, VerificationToken,
};
use crate::error::{AuthError, AuthResult, IdentityField};

const USERNAME_CONSTRAINT: &str = "accounts_username_canonical_key";
const EMAIL_CONSTRAINT: &str = "accounts_email_key";

const ACCOUNT_COLUMNS: &str = r#"
    id,
    username,
    email,
    password_hash,
    recovery_key_hash,
    is_verified,
    verification_token,
    verification_expires_at,
    resend_count,
    last_verification_sent_at,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        let pending = PendingVerification::of(account)?;

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id,
                username,
                username_canonical,
                email,
                password_hash,
                recovery_key_hash,
                is_verified,
                verification_token,
                verification_expires_at,
                resend_count,
                last_verification_sent_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(account.id.into_uuid())
        .bind(account.username.original())
        .bind(account.username.canonical())
        .bind(account.email.as_str())
        .bind(account.password.as_phc_string())
        .bind(account.recovery_key_hash.as_str())
        .bind(pending.is_verified)
        .bind(pending.token)
        .bind(pending.expires_at)
        .bind(pending.resend_count)
        .bind(account.last_verification_sent_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn find(&self, lookup: &AccountLookup) -> AuthResult<Option<Account>> {
        fetch_row(&self.pool, lookup, false)
            .await?
            .map(AccountRow::into_account)
            .transpose()
    }

    async fn exists_by_username(&self, username: &Username) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM accounts
                WHERE username_canonical = $1 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(username.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM accounts
                WHERE email = $1 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update_locked<F, T>(&self, lookup: &AccountLookup, mutate: F) -> AuthResult<Option<T>>
    where
        F: FnOnce(&mut Account) -> AuthResult<T> + Send,
        T: Send,
    {
        // Dropping `tx` on any early return rolls back and releases the lock.
        let mut tx = self.pool.begin().await?;

        let Some(row) = fetch_row(&mut *tx, lookup, true).await? else {
            return Ok(None);
        };
        let mut account = row.into_account()?;

        let output = mutate(&mut account)?;

        write_back(&mut *tx, &account).await?;
        tx.commit().await?;

        Ok(Some(output))
    }
}

// ============================================================================
// Queries
// ============================================================================

enum LookupKey {
    Uuid(Uuid),
    Text(String),
}

fn lookup_filter(lookup: &AccountLookup) -> (&'static str, LookupKey) {
    match lookup {
        AccountLookup::Id(id) => ("id = $1", LookupKey::Uuid(id.into_uuid())),
        AccountLookup::Email(email) => ("email = $1", LookupKey::Text(email.as_str().to_string())),
        AccountLookup::Username(username) => (
            "username_canonical = $1",
            LookupKey::Text(username.canonical().to_string()),
        ),
        AccountLookup::VerificationToken(token) => (
            "verification_token = $1 AND is_verified = FALSE",
            LookupKey::Text(token.clone()),
        ),
        AccountLookup::RecoveryKey(hash) => (
            "recovery_key_hash = $1",
            LookupKey::Text(hash.as_str().to_string()),
        ),
    }
}

async fn fetch_row<'e, E>(
    executor: E,
    lookup: &AccountLookup,
    for_update: bool,
) -> AuthResult<Option<AccountRow>>
where
    E: PgExecutor<'e>,
{
    let (filter, key) = lookup_filter(lookup);
    let sql = format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {filter} AND deleted_at IS NULL{}",
        if for_update { " FOR UPDATE" } else { "" }
    );

    let query = sqlx::query_as::<_, AccountRow>(&sql);
    let query = match key {
        LookupKey::Uuid(id) => query.bind(id),
        LookupKey::Text(text) => query.bind(text),
    };

    Ok(query.fetch_optional(executor).await?)
}

async fn write_back<'e, E>(executor: E, account: &Account) -> AuthResult<()>
where
    E: PgExecutor<'e>,
{
    let pending = PendingVerification::of(account)?;

    sqlx::query(
        r#"
        UPDATE accounts SET
            username = $2,
            username_canonical = $3,
            email = $4,
            password_hash = $5,
            recovery_key_hash = $6,
            is_verified = $7,
            verification_token = $8,
            verification_expires_at = $9,
            resend_count = $10,
            last_verification_sent_at = $11,
            updated_at = $12
        WHERE id = $1
        "#,
    )
    .bind(account.id.into_uuid())
    .bind(account.username.original())
    .bind(account.username.canonical())
    .bind(account.email.as_str())
    .bind(account.password.as_phc_string())
    .bind(account.recovery_key_hash.as_str())
    .bind(pending.is_verified)
    .bind(pending.token)
    .bind(pending.expires_at)
    .bind(pending.resend_count)
    .bind(account.last_verification_sent_at)
    .bind(account.updated_at)
    .execute(executor)
    .await
    .map_err(map_write_error)?;

    Ok(())
}

/// Unique-index collisions become `DuplicateIdentity`.
fn map_write_error(err: sqlx::Error) -> AuthError {
    let duplicate = match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => match db.constraint() {
            Some(USERNAME_CONSTRAINT) => Some(IdentityField::Username),
            Some(EMAIL_CONSTRAINT) => Some(IdentityField::Email),
            _ => None,
        },
        _ => None,
    };
    match duplicate {
        Some(field) => AuthError::DuplicateIdentity(field),
        None => AuthError::Database(err),
    }
}

// ============================================================================
// Row Types
// ============================================================================

/// Column view of `Account::verification`.
struct PendingVerification<'a> {
    is_verified: bool,
    token: Option<&'a str>,
    expires_at: Option<DateTime<Utc>>,
    resend_count: i32,
}

impl<'a> PendingVerification<'a> {
    fn of(account: &'a Account) -> AuthResult<Self> {
        Ok(match &account.verification {
            Verification::Verified => Self {
                is_verified: true,
                token: None,
                expires_at: None,
                resend_count: 0,
            },
            Verification::Unverified {
                token,
                expires_at,
                resend_count,
            } => Self {
                is_verified: false,
                token: Some(token.as_str()),
                expires_at: Some(*expires_at),
                resend_count: i32::try_from(*resend_count)
                    .map_err(|_| AuthError::Internal("resend count out of range".to_string()))?,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    recovery_key_hash: String,
    is_verified: bool,
    verification_token: Option<String>,
    verification_expires_at: Option<DateTime<Utc>>,
    resend_count: i32,
    last_verification_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let verification = if self.is_verified {
            Verification::Verified
        } else {
            let (Some(token), Some(expires_at)) =
                (self.verification_token, self.verification_expires_at)
            else {
                return Err(AuthError::Internal(format!(
                    "Unverified account {} has no pending token",
                    self.id
                )));
            };
            Verification::Unverified {
                token: VerificationToken::new(token),
                expires_at,
                resend_count: u32::try_from(self.resend_count).map_err(|_| {
                    AuthError::Internal(format!("Negative resend_count on {}", self.id))
                })?,
            }
        };

        let password = UserPassword::from_db(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Account {
            id: AccountId::from_uuid(self.id),
            username: Username::from_db(self.username),
            email: Email::from_db(self.email),
            password,
            recovery_key_hash: RecoveryKeyHash::from_db(self.recovery_key_hash),
            verification,
            last_verification_sent_at: self.last_verification_sent_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
