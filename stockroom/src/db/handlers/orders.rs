use tracing::instrument;

use crate::db::context::StorageContext;
use crate::db::errors::Result;
use crate::db::filter::Filter;
use crate::db::models::orders::OrderHistory;
use crate::db::storage::Storage;

/// Lookup parameters for order history queries
#[derive(Debug, Clone, Default)]
pub struct OrderParams {
    pub user_id: Option<i64>,
    pub product_id: Option<i64>,
    pub page: i64,
    pub limit: i64,
}

impl OrderParams {
    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(id) = self.user_id {
            filter = filter.eq("user_id", id);
        }
        if let Some(id) = self.product_id {
            filter = filter.eq("product_id", id);
        }
        filter.paginate(self.page, self.limit)
    }
}

/// Order history persistence.
///
/// Histories are append-only; there is no update or delete.
#[derive(Default)]
pub struct OrdersStorage {
    storage: Storage<OrderHistory>,
}

impl OrdersStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip(self, ctx))]
    pub async fn find_all(&self, ctx: &StorageContext, params: &OrderParams) -> Result<Vec<OrderHistory>> {
        self.storage.find_where(ctx, &params.filter()).await
    }

    /// Count histories matching the params, ignoring pagination
    #[instrument(skip(self, ctx))]
    pub async fn count_all(&self, ctx: &StorageContext, params: &OrderParams) -> Result<i64> {
        self.storage.count_where(ctx, &params.filter()).await
    }

    #[instrument(skip(self, ctx))]
    pub async fn find_by_id(&self, ctx: &StorageContext, id: i64) -> Result<OrderHistory> {
        self.storage.find_one(ctx, &Filter::new().eq("id", id)).await
    }

    #[instrument(skip_all)]
    pub async fn insert(&self, ctx: &StorageContext, order: &mut OrderHistory) -> Result<()> {
        self.storage.insert(ctx, order).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::products::Product;
    use crate::db::models::users::User;
    use crate::db::storage::Storage;
    use chrono::Utc;
    use sqlx::PgPool;

    async fn seed_user_and_product(ctx: &StorageContext) -> (i64, i64) {
        let mut user = User {
            id: 0,
            name: "Buyer".to_string(),
            email: "buyer@example.com".to_string(),
            password_hash: "hash".to_string(),
            token: None,
            token_expired_at: None,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        };
        Storage::<User>::new().insert(ctx, &mut user).await.unwrap();

        let mut product = Product {
            id: 0,
            name: "Widget".to_string(),
            qty: 10,
            price: 2500,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        };
        Storage::<Product>::new().insert(ctx, &mut product).await.unwrap();

        (user.id, product.id)
    }

    #[sqlx::test]
    async fn orders_are_scoped_to_their_user(pool: PgPool) {
        let ctx = StorageContext::new(pool);
        let orders = OrdersStorage::new();
        let (user_id, product_id) = seed_user_and_product(&ctx).await;

        let mut order = OrderHistory {
            id: 0,
            user_id,
            product_id,
            qty: 2,
            price: 2500,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        };
        orders.insert(&ctx, &mut order).await.unwrap();

        let mine = OrderParams {
            user_id: Some(user_id),
            ..Default::default()
        };
        assert_eq!(orders.find_all(&ctx, &mine).await.unwrap().len(), 1);

        let theirs = OrderParams {
            user_id: Some(user_id + 1),
            ..Default::default()
        };
        assert!(orders.find_all(&ctx, &theirs).await.unwrap().is_empty());

        let found = orders.find_by_id(&ctx, order.id).await.unwrap();
        assert_eq!(found.qty, 2);
        assert_eq!(found.price, 2500);
    }
}
