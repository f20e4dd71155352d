//! Product catalog endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::instrument;

use crate::{
    AppState,
    api::models::{
        pagination::ListResponse,
        products::{CreateProductRequest, ListProductsQuery, ProductResponse, UpdateProductRequest},
        users::CurrentUser,
    },
    db::errors::DbError,
    db::handlers::products::{ProductParams, ProductsStorage},
    db::models::products::Product,
    errors::{Error, Result},
};

fn name_taken(err: Error) -> Error {
    match err {
        Error::Database(DbError::AlreadyExists) => Error::Unprocessable {
            message: "A product with this name already exists".to_string(),
        },
        other => other,
    }
}

/// List products, optionally filtered by a name search.
#[instrument(skip(state, _current))]
pub async fn list_products(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ListResponse<ProductResponse>>> {
    let ctx = state.data.context();
    let products = ProductsStorage::new();

    let params = ProductParams {
        search: query.search,
        page: query.page,
        limit: query.limit,
        ..Default::default()
    };
    let rows = products.find_all(&ctx, &params).await?;
    let count = products.count_all(&ctx, &params).await?;

    Ok(Json(ListResponse {
        data: rows.into_iter().map(ProductResponse::from).collect(),
        count,
    }))
}

/// Fetch a single product.
#[instrument(skip(state, _current))]
pub async fn get_product(State(state): State<AppState>, _current: CurrentUser, Path(id): Path<i64>) -> Result<Json<ProductResponse>> {
    let ctx = state.data.context();
    let product = ProductsStorage::new().find_by_id(&ctx, id).await?;
    Ok(Json(product.into()))
}

/// Add a product to the catalog.
#[instrument(skip(state, _current, request))]
pub async fn create_product(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    request.validate()?;

    let mut product = Product {
        id: 0,
        name: request.name,
        qty: request.qty,
        price: request.price,
        created_at: Utc::now(),
        updated_at: None,
        deleted_at: None,
    };

    let ctx = state.data.context();
    let product = state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            ProductsStorage::new().insert(&tx_ctx, &mut product).await?;
            Ok(product)
        })
        .await
        .map_err(name_taken)?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Replace a product's name, stock, and price.
#[instrument(skip(state, _current, request))]
pub async fn update_product(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>> {
    request.validate()?;

    let ctx = state.data.context();
    let product = state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            let products = ProductsStorage::new();
            let mut product = products.find_by_id(&tx_ctx, id).await?;
            product.name = request.name;
            product.qty = request.qty;
            product.price = request.price;
            products.update(&tx_ctx, &mut product).await?;
            Ok(product)
        })
        .await
        .map_err(name_taken)?;

    Ok(Json(product.into()))
}

/// Soft-delete a product.
#[instrument(skip(state, _current))]
pub async fn delete_product(State(state): State<AppState>, _current: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode> {
    let ctx = state.data.context();
    state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            ProductsStorage::new().delete(&tx_ctx, id).await.map_err(Error::from)
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
