//! Execution contexts for storage operations.
//!
//! A [`StorageContext`] travels with each request and decides where SQL runs:
//! inside the transaction the context carries, or on a connection checked out
//! from the pool. Contexts are cheap to clone and share the underlying
//! transaction slot, so nested units of work join the same transaction
//! instead of opening their own.

use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use crate::db::errors::{DbError, Result};

/// Shared slot holding an open transaction.
///
/// The slot becomes `None` once the transaction is committed or rolled back;
/// operations that still hold a context derived from it fail instead of
/// silently running outside the transaction.
type TxSlot = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// Where a statement will execute: the context's transaction or a pooled
/// connection.
pub(crate) enum Handle<'c> {
    Transaction(MutexGuard<'c, Option<Transaction<'static, Postgres>>>),
    Pooled(PoolConnection<Postgres>),
}

impl Handle<'_> {
    /// The concrete connection to run on.
    ///
    /// Fails with [`DbError::Other`] when the carried transaction has already
    /// completed, which indicates a unit of work escaping its
    /// `run_in_transaction` scope.
    pub(crate) fn connection(&mut self) -> Result<&mut PgConnection> {
        match self {
            Handle::Transaction(guard) => match guard.as_mut() {
                Some(tx) => Ok(&mut *tx),
                None => Err(DbError::Other(anyhow::anyhow!("transaction already completed"))),
            },
            Handle::Pooled(conn) => Ok(&mut *conn),
        }
    }
}

/// Request-scoped database context.
///
/// Carries the pool, an optional shared transaction, and a cancellation
/// token. Handlers thread one context through every storage call they make.
#[derive(Clone)]
pub struct StorageContext {
    pool: PgPool,
    tx: Option<TxSlot>,
    cancel: CancellationToken,
}

impl StorageContext {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tx: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token; storage operations racing against it fail
    /// with [`DbError::Cancelled`] once it trips.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Whether this context already runs inside a transaction
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Derive a child context that executes on the given transaction
    pub(crate) fn begin_with(&self, tx: Transaction<'static, Postgres>) -> Self {
        Self {
            pool: self.pool.clone(),
            tx: Some(Arc::new(Mutex::new(Some(tx)))),
            cancel: self.cancel.clone(),
        }
    }

    /// Resolve the execution handle for the next statement: the shared
    /// transaction when one is carried, otherwise a fresh pooled connection.
    pub(crate) async fn resolve(&self) -> Result<Handle<'_>> {
        match &self.tx {
            Some(slot) => Ok(Handle::Transaction(slot.lock().await)),
            None => {
                let conn = self.guard(self.pool.acquire()).await?.map_err(DbError::storage("acquire connection"))?;
                Ok(Handle::Pooled(conn))
            }
        }
    }

    /// Remove the carried transaction so it can be committed or rolled back.
    ///
    /// Returns `None` when the context carries no transaction or it has
    /// already completed.
    pub(crate) async fn take_transaction(&self) -> Option<OwnedTransaction> {
        let slot = self.tx.clone()?;
        let mut guard = slot.lock_owned().await;
        if guard.is_none() {
            return None;
        }
        Some(OwnedTransaction { guard })
    }

    /// Race a future against cancellation.
    ///
    /// Checks the token up front so an already-cancelled context fails
    /// deterministically before touching the database.
    pub(crate) async fn guard<F>(&self, fut: F) -> Result<F::Output>
    where
        F: Future,
    {
        if self.cancel.is_cancelled() {
            return Err(DbError::Cancelled);
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(DbError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

/// Exclusive access to a context's transaction for completing it.
///
/// Holding the owned lock guard for the duration of commit/rollback keeps
/// sibling context clones from resolving the slot mid-completion; the slot is
/// left empty afterwards.
pub(crate) struct OwnedTransaction {
    guard: OwnedMutexGuard<Option<Transaction<'static, Postgres>>>,
}

impl OwnedTransaction {
    pub(crate) async fn commit(mut self) -> Result<()> {
        match self.guard.take() {
            Some(tx) => tx.commit().await.map_err(DbError::storage("commit transaction")),
            None => Ok(()),
        }
    }

    pub(crate) async fn rollback(mut self) -> Result<()> {
        match self.guard.take() {
            Some(tx) => tx.rollback().await.map_err(DbError::storage("rollback transaction")),
            None => Ok(()),
        }
    }
}
