use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::db::record::{Record, SqlValue};

/// One completed purchase.
///
/// `price` is the unit price at the time of purchase, so later product edits
/// do not rewrite history.
#[derive(Debug, Clone, FromRow)]
pub struct OrderHistory {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub qty: i64,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for OrderHistory {
    const TABLE: &'static str = "order_histories";
    const COLUMNS: &'static [&'static str] = &["user_id", "product_id", "qty", "price"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.user_id.into(), self.product_id.into(), self.qty.into(), self.price.into()]
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = Some(at);
    }

    fn stamp_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}
