use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::db::record::{Record, SqlValue};

/// A sellable item with its remaining stock and unit price.
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub qty: i64,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for Product {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &["name", "qty", "price"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.name.as_str().into(), self.qty.into(), self.price.into()]
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = Some(at);
    }

    fn stamp_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}
