use tracing::instrument;

use crate::db::context::StorageContext;
use crate::db::errors::Result;
use crate::db::filter::Filter;
use crate::db::models::products::Product;
use crate::db::storage::Storage;

/// Lookup parameters for product queries
#[derive(Debug, Clone, Default)]
pub struct ProductParams {
    pub product_id: Option<i64>,
    pub name: Option<String>,
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl ProductParams {
    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(id) = self.product_id {
            filter = filter.eq("id", id);
        }
        if let Some(name) = &self.name {
            filter = filter.eq("name", name.as_str());
        }
        if let Some(search) = &self.search {
            filter = filter.ilike("name", format!("%{search}%"));
        }
        filter.paginate(self.page, self.limit)
    }
}

/// Product persistence
#[derive(Default)]
pub struct ProductsStorage {
    storage: Storage<Product>,
}

impl ProductsStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip(self, ctx))]
    pub async fn find_all(&self, ctx: &StorageContext, params: &ProductParams) -> Result<Vec<Product>> {
        self.storage.find_where(ctx, &params.filter()).await
    }

    /// Count products matching the params, ignoring pagination
    #[instrument(skip(self, ctx))]
    pub async fn count_all(&self, ctx: &StorageContext, params: &ProductParams) -> Result<i64> {
        self.storage.count_where(ctx, &params.filter()).await
    }

    #[instrument(skip(self, ctx))]
    pub async fn find_by_id(&self, ctx: &StorageContext, id: i64) -> Result<Product> {
        self.storage.find_one(ctx, &Filter::new().eq("id", id)).await
    }

    #[instrument(skip(self, ctx))]
    pub async fn find_by_name(&self, ctx: &StorageContext, name: &str) -> Result<Product> {
        self.storage.find_one(ctx, &Filter::new().eq("name", name)).await
    }

    #[instrument(skip_all)]
    pub async fn insert(&self, ctx: &StorageContext, product: &mut Product) -> Result<()> {
        self.storage.insert(ctx, product).await
    }

    #[instrument(skip_all, fields(id = product.id))]
    pub async fn update(&self, ctx: &StorageContext, product: &mut Product) -> Result<()> {
        self.storage.update(ctx, product).await
    }

    #[instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &StorageContext, id: i64) -> Result<()> {
        self.storage.delete(ctx, id).await
    }
}
