//! Sample data seeding for local development.
//!
//! Idempotent: rows that already exist are left untouched, so reseeding never
//! clobbers manual changes.

use chrono::Utc;
use tracing::{info, instrument};

use crate::{
    AppState,
    auth::password,
    db::errors::DbError,
    db::handlers::{products::ProductsStorage, users::UsersStorage},
    db::models::{products::Product, users::User},
    errors::Error,
};

const SAMPLE_USERS: &[(&str, &str, &str)] = &[
    ("Alice Example", "alice@example.com", "alice password"),
    ("Bob Example", "bob@example.com", "bob password"),
];

const SAMPLE_PRODUCTS: &[(&str, i64, i64)] = &[
    ("Linen Shirt", 25, 25000),
    ("Coffee Mug", 100, 4000),
    ("Notebook", 50, 6500),
];

/// Seed sample users and products.
#[instrument(skip_all)]
pub async fn seed_database(state: &AppState) -> anyhow::Result<()> {
    let ctx = state.data.context();
    state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            let users = UsersStorage::new();
            for (name, email, plain_password) in SAMPLE_USERS {
                match users.find_by_email(&tx_ctx, email).await {
                    Ok(_) => continue,
                    Err(DbError::NotFound) => {}
                    Err(e) => return Err(e.into()),
                }

                let mut user = User {
                    id: 0,
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash: password::hash_string(plain_password)?,
                    token: None,
                    token_expired_at: None,
                    created_at: Utc::now(),
                    updated_at: None,
                    deleted_at: None,
                };
                users.insert(&tx_ctx, &mut user).await?;
                info!("Seeded user {email}");
            }

            let products = ProductsStorage::new();
            for (name, qty, price) in SAMPLE_PRODUCTS {
                match products.find_by_name(&tx_ctx, name).await {
                    Ok(_) => continue,
                    Err(DbError::NotFound) => {}
                    Err(e) => return Err(e.into()),
                }

                let mut product = Product {
                    id: 0,
                    name: name.to_string(),
                    qty: *qty,
                    price: *price,
                    created_at: Utc::now(),
                    updated_at: None,
                    deleted_at: None,
                };
                products.insert(&tx_ctx, &mut product).await?;
                info!("Seeded product {name}");
            }

            Ok(())
        })
        .await?;

    info!("Database seeded");
    Ok(())
}
