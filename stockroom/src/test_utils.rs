//! Shared helpers for integration-style handler tests.

use axum_test::TestServer;
use serde_json::json;
use sqlx::PgPool;

use crate::{AppState, Config, build_router, db::DataManager};

/// App state over a test pool (migrations already applied by `#[sqlx::test]`)
pub fn test_state(pool: PgPool) -> AppState {
    AppState {
        data: DataManager::new(pool),
        config: Config::default(),
    }
}

/// Spin up a test server over the given pool
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let router = build_router(test_state(pool));
    TestServer::new(router).expect("Failed to create test server")
}

/// Register an account via the public endpoint, returning its id
pub async fn register_user(server: &TestServer, name: &str, email: &str, password: &str) -> i64 {
    let response = server
        .post("/v1/users")
        .json(&json!({"name": name, "email": email, "password": password}))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<serde_json::Value>()["id"].as_i64().expect("user id")
}

/// Log in, returning the bearer token
pub async fn login_user(server: &TestServer, email: &str, password: &str) -> String {
    let response = server.post("/v1/login").json(&json!({"email": email, "password": password})).await;
    response.assert_status_ok();
    response.json::<serde_json::Value>()["token"].as_str().expect("token").to_string()
}

/// Register a default account and log in with it
pub async fn signup_and_login(server: &TestServer) -> String {
    register_user(server, "Test User", "test@example.com", "test password").await;
    login_user(server, "test@example.com", "test password").await
}

/// Create a product, returning its id
pub async fn create_test_product(server: &TestServer, token: &str, name: &str, qty: i64, price: i64) -> i64 {
    let response = server
        .post("/v1/products")
        .authorization_bearer(token)
        .json(&json!({"name": name, "qty": qty, "price": price}))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<serde_json::Value>()["id"].as_i64().expect("product id")
}
