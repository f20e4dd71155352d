//! # stockroom: a small commerce service
//!
//! `stockroom` exposes a RESTful API for user accounts, a product catalog,
//! and order placement, backed by PostgreSQL. Users register and log in with
//! email and password, receive an opaque bearer token, and use it to browse
//! products and place orders. Placing an order atomically checks stock,
//! decrements it, and records the purchase with the price at that moment.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and [sqlx](https://github.com/launchbadge/sqlx) for
//! persistence.
//!
//! The **API layer** ([`api`]) follows RESTful conventions under `/v1`:
//! login/logout, user management, the product catalog, and orders. Handlers
//! validate input, run their writes inside transactions, and convert rows to
//! response models.
//!
//! The **authentication layer** ([`auth`]) hashes passwords with Argon2id and
//! issues opaque session tokens stored on the user row. An extractor resolves
//! the bearer token on each request.
//!
//! The **database layer** ([`db`]) is a generic storage core: each entity
//! declares its table binding once via the `Record` trait, and a single
//! storage façade implements filtered reads, inserts, updates, and soft
//! deletes for all of them. A context object decides whether statements run
//! on a pooled connection or inside a shared transaction, and the transaction
//! manager flattens nested units of work into one transaction.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use stockroom::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = stockroom::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     stockroom::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod seeder;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Router,
    routing::{get, post, put},
};
pub use config::Config;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};

use crate::db::DataManager;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub data: DataManager,
    pub config: Config,
}

/// Get the stockroom database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/login", post(api::handlers::auth::login))
        .route("/logout", get(api::handlers::auth::logout))
        // Users (registration is public; the rest requires a session)
        .route("/users", get(api::handlers::users::list_users).post(api::handlers::users::create_user))
        .route("/users/password", put(api::handlers::users::update_password))
        .route(
            "/users/{id}",
            put(api::handlers::users::update_user).delete(api::handlers::users::delete_user),
        )
        // Product catalog
        .route(
            "/products",
            get(api::handlers::products::list_products).post(api::handlers::products::create_product),
        )
        .route(
            "/products/{id}",
            get(api::handlers::products::get_product)
                .put(api::handlers::products::update_product)
                .delete(api::handlers::products::delete_product),
        )
        // Orders
        .route(
            "/orders",
            get(api::handlers::orders::list_orders).post(api::handlers::orders::create_order),
        )
        .with_state(state);

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database and runs
///    migrations
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    state: AppState,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.database.acquire_timeout_secs))
            .connect(&config.database_url)
            .await?;
        migrator().run(&pool).await?;

        let state = AppState {
            data: DataManager::new(pool.clone()),
            config: config.clone(),
        };
        let router = build_router(state.clone());

        Ok(Self {
            router,
            state,
            config,
            pool,
        })
    }

    /// Populate the database with sample users and products
    pub async fn seed(&self) -> anyhow::Result<()> {
        seeder::seed_database(&self.state).await
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Stockroom listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::create_test_app;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn health_check_responds(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }
}
