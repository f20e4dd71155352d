use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::orders::OrderHistory;
use crate::errors::Error;

/// Order representation returned by the API.
///
/// `total` is derived from the recorded unit price, not the product's current
/// price.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub qty: i64,
    pub price: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

impl From<OrderHistory> for OrderResponse {
    fn from(order: OrderHistory) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            product_id: order.product_id,
            qty: order.qty,
            price: order.price,
            total: order.price * order.qty,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: i64,
    pub qty: i64,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), Error> {
        if self.qty <= 0 {
            return Err(Error::BadRequest {
                message: "qty must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Query parameters for listing orders
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub limit: i64,
}
