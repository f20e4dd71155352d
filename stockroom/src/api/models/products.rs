use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::products::Product;
use crate::errors::Error;

/// Product representation returned by the API
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub qty: i64,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            qty: product.qty,
            price: product.price,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub qty: i64,
    pub price: i64,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), Error> {
        validate_product_fields(&self.name, self.qty, self.price)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    pub qty: i64,
    pub price: i64,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), Error> {
        validate_product_fields(&self.name, self.qty, self.price)
    }
}

fn validate_product_fields(name: &str, qty: i64, price: i64) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "name must not be empty".to_string(),
        });
    }
    if qty < 0 {
        return Err(Error::BadRequest {
            message: "qty must not be negative".to_string(),
        });
    }
    if price < 0 {
        return Err(Error::BadRequest {
            message: "price must not be negative".to_string(),
        });
    }
    Ok(())
}

/// Query parameters for listing products
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub limit: i64,
}
