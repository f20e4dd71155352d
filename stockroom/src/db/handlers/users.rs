use tracing::instrument;

use crate::db::context::StorageContext;
use crate::db::errors::Result;
use crate::db::filter::Filter;
use crate::db::models::users::User;
use crate::db::storage::Storage;

/// Lookup parameters for user queries.
///
/// Unset fields are simply not filtered on; `search` matches names
/// case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct UserParams {
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub token: Option<String>,
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl UserParams {
    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(id) = self.user_id {
            filter = filter.eq("id", id);
        }
        if let Some(email) = &self.email {
            filter = filter.eq("email", email.as_str());
        }
        if let Some(name) = &self.name {
            filter = filter.eq("name", name.as_str());
        }
        if let Some(token) = &self.token {
            filter = filter.eq("token", token.as_str());
        }
        if let Some(search) = &self.search {
            filter = filter.ilike("name", format!("%{search}%"));
        }
        filter.paginate(self.page, self.limit)
    }
}

/// User persistence
#[derive(Default)]
pub struct UsersStorage {
    storage: Storage<User>,
}

impl UsersStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip(self, ctx))]
    pub async fn find_all(&self, ctx: &StorageContext, params: &UserParams) -> Result<Vec<User>> {
        self.storage.find_where(ctx, &params.filter()).await
    }

    /// Count users matching the params, ignoring pagination
    #[instrument(skip(self, ctx))]
    pub async fn count_all(&self, ctx: &StorageContext, params: &UserParams) -> Result<i64> {
        self.storage.count_where(ctx, &params.filter()).await
    }

    #[instrument(skip(self, ctx))]
    pub async fn find_by_id(&self, ctx: &StorageContext, id: i64) -> Result<User> {
        self.storage.find_one(ctx, &Filter::new().eq("id", id)).await
    }

    #[instrument(skip(self, ctx))]
    pub async fn find_by_email(&self, ctx: &StorageContext, email: &str) -> Result<User> {
        self.storage.find_one(ctx, &Filter::new().eq("email", email)).await
    }

    #[instrument(skip(self, ctx, token))]
    pub async fn find_by_token(&self, ctx: &StorageContext, token: &str) -> Result<User> {
        self.storage.find_one(ctx, &Filter::new().eq("token", token)).await
    }

    #[instrument(skip_all)]
    pub async fn insert(&self, ctx: &StorageContext, user: &mut User) -> Result<()> {
        self.storage.insert(ctx, user).await
    }

    #[instrument(skip_all, fields(id = user.id))]
    pub async fn update(&self, ctx: &StorageContext, user: &mut User) -> Result<()> {
        self.storage.update(ctx, user).await
    }

    #[instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &StorageContext, id: i64) -> Result<()> {
        self.storage.delete(ctx, id).await
    }
}
