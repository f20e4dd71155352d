//! Generic storage façade.
//!
//! One implementation of the persistence verbs (`find_where`, `insert`,
//! `update`, `delete`) serves every [`Record`] type. Statements come from the
//! builders in [`crate::db::statement`]; execution goes through the
//! [`StorageContext`] so a single call site works both inside and outside a
//! transaction.

use std::marker::PhantomData;

use chrono::Utc;
use tracing::instrument;

use crate::db::context::StorageContext;
use crate::db::errors::{DbError, Result};
use crate::db::filter::Filter;
use crate::db::record::Record;
use crate::db::statement;

/// Typed handle over one table.
///
/// Zero-sized; the table binding lives in the [`Record`] impl. Domain
/// storages embed one of these per entity they manage.
pub struct Storage<R> {
    record: PhantomData<fn() -> R>,
}

impl<R> Default for Storage<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Storage<R> {
    pub fn new() -> Self {
        Self { record: PhantomData }
    }
}

impl<R: Record> Storage<R> {
    /// Fetch all rows matching the filter, newest first.
    ///
    /// Soft-deleted rows are excluded unless the filter opts in; pagination
    /// applies only when the filter requests it.
    #[instrument(skip(self, ctx, filter), fields(table = R::TABLE))]
    pub async fn find_where(&self, ctx: &StorageContext, filter: &Filter) -> Result<Vec<R>> {
        let mut builder = statement::select::<R>(filter)?;
        let mut handle = ctx.resolve().await?;
        let conn = handle.connection()?;
        ctx.guard(builder.build_query_as::<R>().fetch_all(&mut *conn))
            .await?
            .map_err(DbError::storage(format!("select from {}", R::TABLE)))
    }

    /// Fetch the single newest row matching the filter
    #[instrument(skip(self, ctx, filter), fields(table = R::TABLE))]
    pub async fn find_one(&self, ctx: &StorageContext, filter: &Filter) -> Result<R> {
        let rows = self.find_where(ctx, &filter.clone().paginate(1, 1)).await?;
        rows.into_iter().next().ok_or(DbError::NotFound)
    }

    /// Count rows matching the filter, ignoring any pagination it carries
    #[instrument(skip(self, ctx, filter), fields(table = R::TABLE))]
    pub async fn count_where(&self, ctx: &StorageContext, filter: &Filter) -> Result<i64> {
        let rows = self.find_where(ctx, &filter.clone().paginate(0, 0)).await?;
        Ok(rows.len() as i64)
    }

    /// Persist a new record.
    ///
    /// The database assigns the primary key, which is written back into the
    /// record along with the creation timestamp.
    #[instrument(skip(self, ctx, record), fields(table = R::TABLE))]
    pub async fn insert(&self, ctx: &StorageContext, record: &mut R) -> Result<()> {
        let now = Utc::now();
        let mut builder = statement::insert(record, now);
        let mut handle = ctx.resolve().await?;
        let conn = handle.connection()?;
        let id: i64 = ctx
            .guard(builder.build_query_scalar().fetch_one(&mut *conn))
            .await?
            .map_err(DbError::storage(format!("insert into {}", R::TABLE)))?;
        record.set_id(id);
        record.stamp_created(now);
        Ok(())
    }

    /// Write the record's entity columns back to its row.
    ///
    /// Fails with [`DbError::NotFound`] when the row is missing or
    /// soft-deleted.
    #[instrument(skip(self, ctx, record), fields(table = R::TABLE, id = record.id()))]
    pub async fn update(&self, ctx: &StorageContext, record: &mut R) -> Result<()> {
        let now = Utc::now();
        let mut builder = statement::update(record, now);
        let mut handle = ctx.resolve().await?;
        let conn = handle.connection()?;
        let result = ctx
            .guard(builder.build().execute(&mut *conn))
            .await?
            .map_err(DbError::storage(format!("update {}", R::TABLE)))?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        record.stamp_updated(now);
        Ok(())
    }

    /// Soft-delete the row with the given id.
    ///
    /// The row stays in the table but disappears from default reads. Deleting
    /// an already-deleted or missing row fails with [`DbError::NotFound`].
    #[instrument(skip(self, ctx), fields(table = R::TABLE))]
    pub async fn delete(&self, ctx: &StorageContext, id: i64) -> Result<()> {
        let now = Utc::now();
        let mut builder = statement::soft_delete::<R>(id, now);
        let mut handle = ctx.resolve().await?;
        let conn = handle.connection()?;
        let result = ctx
            .guard(builder.build().execute(&mut *conn))
            .await?
            .map_err(DbError::storage(format!("delete from {}", R::TABLE)))?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::products::Product;
    use sqlx::PgPool;
    use tokio_util::sync::CancellationToken;

    fn product(name: &str, qty: i64, price: i64) -> Product {
        Product {
            id: 0,
            name: name.to_string(),
            qty,
            price,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        }
    }

    #[sqlx::test]
    async fn insert_assigns_id_and_round_trips(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        let mut record = product("plain tee", 10, 15000);
        storage.insert(&ctx, &mut record).await.unwrap();
        assert!(record.id > 0);

        let found = storage.find_one(&ctx, &Filter::new().eq("id", record.id)).await.unwrap();
        assert_eq!(found.name, "plain tee");
        assert_eq!(found.qty, 10);
        assert_eq!(found.price, 15000);
        assert!(found.deleted_at.is_none());
    }

    #[sqlx::test]
    async fn find_where_orders_newest_first(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        let mut first = product("first", 1, 100);
        let mut second = product("second", 1, 100);
        storage.insert(&ctx, &mut first).await.unwrap();
        storage.insert(&ctx, &mut second).await.unwrap();

        let rows = storage.find_where(&ctx, &Filter::new()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "second");
        assert_eq!(rows[1].name, "first");
    }

    #[sqlx::test]
    async fn pagination_slices_the_result(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        for i in 0..5 {
            let mut record = product(&format!("item {i}"), 1, 100);
            storage.insert(&ctx, &mut record).await.unwrap();
        }

        let page = storage.find_where(&ctx, &Filter::new().paginate(2, 2)).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "item 2");
        assert_eq!(page[1].name, "item 1");

        let all = storage.find_where(&ctx, &Filter::new().paginate(0, 0)).await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[sqlx::test]
    async fn count_ignores_pagination(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        for i in 0..5 {
            let mut record = product(&format!("counted {i}"), 1, 100);
            storage.insert(&ctx, &mut record).await.unwrap();
        }

        let count = storage.count_where(&ctx, &Filter::new().paginate(1, 2)).await.unwrap();
        assert_eq!(count, 5);
    }

    #[sqlx::test]
    async fn ilike_matches_case_insensitively(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        let mut shirt = product("Linen Shirt", 1, 100);
        let mut mug = product("Coffee Mug", 1, 100);
        storage.insert(&ctx, &mut shirt).await.unwrap();
        storage.insert(&ctx, &mut mug).await.unwrap();

        let rows = storage.find_where(&ctx, &Filter::new().ilike("name", "%shirt%")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Linen Shirt");
    }

    #[sqlx::test]
    async fn delete_hides_the_row_from_default_reads(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        let mut record = product("ephemeral", 1, 100);
        storage.insert(&ctx, &mut record).await.unwrap();
        storage.delete(&ctx, record.id).await.unwrap();

        let visible = storage.find_where(&ctx, &Filter::new().eq("id", record.id)).await.unwrap();
        assert!(visible.is_empty());

        let with_deleted = storage
            .find_where(&ctx, &Filter::new().eq("id", record.id).include_deleted())
            .await
            .unwrap();
        assert_eq!(with_deleted.len(), 1);
        assert!(with_deleted[0].deleted_at.is_some());
    }

    #[sqlx::test]
    async fn delete_twice_reports_not_found(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        let mut record = product("once", 1, 100);
        storage.insert(&ctx, &mut record).await.unwrap();
        storage.delete(&ctx, record.id).await.unwrap();

        let err = storage.delete(&ctx, record.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    async fn update_rewrites_entity_columns(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        let mut record = product("draft", 1, 100);
        storage.insert(&ctx, &mut record).await.unwrap();

        record.name = "final".to_string();
        record.qty = 7;
        storage.update(&ctx, &mut record).await.unwrap();
        assert!(record.updated_at.is_some());

        let found = storage.find_one(&ctx, &Filter::new().eq("id", record.id)).await.unwrap();
        assert_eq!(found.name, "final");
        assert_eq!(found.qty, 7);
    }

    #[sqlx::test]
    async fn update_of_missing_row_reports_not_found(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        let mut record = product("ghost", 1, 100);
        record.id = 424242;
        let err = storage.update(&ctx, &mut record).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    async fn duplicate_unique_column_reports_already_exists(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        let mut original = product("unique name", 1, 100);
        storage.insert(&ctx, &mut original).await.unwrap();

        let mut duplicate = product("unique name", 2, 200);
        let err = storage.insert(&ctx, &mut duplicate).await.unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists));
    }

    #[sqlx::test]
    async fn deleted_name_can_be_reused(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let storage = Storage::<Product>::new();

        let mut original = product("recycled", 1, 100);
        storage.insert(&ctx, &mut original).await.unwrap();
        storage.delete(&ctx, original.id).await.unwrap();

        let mut replacement = product("recycled", 3, 300);
        storage.insert(&ctx, &mut replacement).await.unwrap();
        assert_ne!(replacement.id, original.id);
    }

    #[sqlx::test]
    async fn cancelled_context_aborts_before_executing(pool: PgPool) {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = StorageContext::new(pool).with_cancellation(cancel);
        let storage = Storage::<Product>::new();

        let err = storage.find_where(&ctx, &Filter::new()).await.unwrap_err();
        assert!(matches!(err, DbError::Cancelled));
    }
}
