//! Row-scoped database sessions.
//!
//! A scoped session is one transaction on a pooled connection with the
//! `app.current_user_id` setting bound to the owner for that transaction
//! only. Row-security policies read the setting, so every statement run
//! through the session sees and writes the owner's rows and nothing else.
//! The setting is transaction-local: commit or rollback clears it before the
//! connection returns to the pool.

use std::fmt;
use std::sync::Arc;

use sqlx::postgres::{PgConnection, PgPool};
use sqlx::{Postgres, Transaction};
use thiserror::Error;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use uuid::Uuid;

/// Session variable read by the row-security policies.
pub const SCOPE_SETTING: &str = "app.current_user_id";

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("scoped session already finished")]
    Closed,
}

/// A live scoped session. Clones share the same transaction.
#[trait_variant::make(ScopedHandle: Send)]
pub trait LocalScopedHandle: Clone + Sync + 'static {
    fn owner(&self) -> Uuid;

    async fn commit(&self) -> Result<(), ScopeError>;

    async fn rollback(&self) -> Result<(), ScopeError>;
}

/// Opens scoped sessions.
#[trait_variant::make(ScopeBinder: Send)]
pub trait LocalScopeBinder: Clone + Sync + 'static {
    type Handle: ScopedHandle;

    async fn bind(&self, owner: Uuid) -> Result<Self::Handle, ScopeError>;
}

// ============================================================================
// PostgreSQL
// ============================================================================

#[derive(Clone)]
pub struct PgScopeBinder {
    pool: PgPool,
}

impl PgScopeBinder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ScopeBinder for PgScopeBinder {
    type Handle = PgScopedSession;

    async fn bind(&self, owner: Uuid) -> Result<PgScopedSession, ScopeError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config($1, $2, true)")
            .bind(SCOPE_SETTING)
            .bind(owner.to_string())
            .execute(&mut *tx)
            .await?;

        tracing::trace!(%owner, "Scoped session opened");
        Ok(PgScopedSession {
            owner,
            tx: Arc::new(Mutex::new(Some(tx))),
        })
    }
}

/// Dropping the last clone without commit rolls the transaction back.
#[derive(Clone)]
pub struct PgScopedSession {
    owner: Uuid,
    tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl PgScopedSession {
    /// Exclusive access to the session's connection for running queries.
    pub async fn acquire(&self) -> Result<MappedMutexGuard<'_, PgConnection>, ScopeError> {
        let guard = self.tx.lock().await;
        MutexGuard::try_map(guard, |slot| slot.as_deref_mut()).map_err(|_| ScopeError::Closed)
    }

    async fn finish(&self) -> Result<Transaction<'static, Postgres>, ScopeError> {
        self.tx.lock().await.take().ok_or(ScopeError::Closed)
    }
}

impl ScopedHandle for PgScopedSession {
    fn owner(&self) -> Uuid {
        self.owner
    }

    async fn commit(&self) -> Result<(), ScopeError> {
        self.finish().await?.commit().await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), ScopeError> {
        self.finish().await?.rollback().await?;
        Ok(())
    }
}

impl fmt::Debug for PgScopedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgScopedSession")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
