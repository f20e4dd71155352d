//! Transaction management.
//!
//! [`DataManager::run_in_transaction`] is the only place transactions are
//! opened and completed. Units of work receive a context bound to the
//! transaction; calling the manager again with such a context joins the
//! ongoing transaction instead of nesting a new one, so only the outermost
//! call commits or rolls back.

use sqlx::PgPool;
use tracing::instrument;

use crate::db::context::StorageContext;
use crate::db::errors::DbError;

/// Hands out storage contexts and runs units of work transactionally.
#[derive(Clone)]
pub struct DataManager {
    pool: PgPool,
}

impl DataManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A fresh context executing directly on the pool
    pub fn context(&self) -> StorageContext {
        StorageContext::new(self.pool.clone())
    }

    /// Run `work` inside a transaction.
    ///
    /// When `ctx` already carries a transaction the work joins it and the
    /// outcome is left to the outermost caller. Otherwise a transaction is
    /// opened here; `Ok` commits it, `Err` rolls it back and the original
    /// error is returned. A rollback failure is logged, not surfaced, so it
    /// cannot mask the error that triggered it.
    #[instrument(skip_all)]
    pub async fn run_in_transaction<T, E, F, Fut>(&self, ctx: &StorageContext, work: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(StorageContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if ctx.in_transaction() {
            return work(ctx.clone()).await;
        }

        let tx = ctx
            .guard(self.pool.begin())
            .await
            .map_err(E::from)?
            .map_err(DbError::storage("begin transaction"))
            .map_err(E::from)?;
        let tx_ctx = ctx.begin_with(tx);

        match work(tx_ctx.clone()).await {
            Ok(value) => {
                if let Some(tx) = tx_ctx.take_transaction().await {
                    tx.commit().await.map_err(E::from)?;
                }
                Ok(value)
            }
            Err(err) => {
                if let Some(tx) = tx_ctx.take_transaction().await {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::warn!(error = %rollback_err, "failed to roll back transaction");
                    }
                }
                Err(err)
            }
        }
    }
}
