//! Order endpoints.
//!
//! Placing an order reserves stock and records history atomically: the stock
//! check, the quantity decrement, and the history insert all happen in one
//! transaction.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::instrument;

use crate::{
    AppState,
    api::models::{
        orders::{CreateOrderRequest, ListOrdersQuery, OrderResponse},
        pagination::ListResponse,
        users::CurrentUser,
    },
    db::errors::DbError,
    db::handlers::orders::{OrderParams, OrdersStorage},
    db::handlers::products::ProductsStorage,
    db::models::orders::OrderHistory,
    errors::{Error, Result},
};

/// List the signed-in user's order history.
#[instrument(skip(state, current), fields(user_id = current.id))]
pub async fn list_orders(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<ListResponse<OrderResponse>>> {
    let ctx = state.data.context();
    let orders = OrdersStorage::new();

    let params = OrderParams {
        user_id: Some(current.id),
        page: query.page,
        limit: query.limit,
        ..Default::default()
    };
    let rows = orders.find_all(&ctx, &params).await?;
    let count = orders.count_all(&ctx, &params).await?;

    Ok(Json(ListResponse {
        data: rows.into_iter().map(OrderResponse::from).collect(),
        count,
    }))
}

/// Place an order for a product.
///
/// The recorded price is the product's unit price at purchase time. Fails
/// when the product is missing or the remaining stock is insufficient, and in
/// both failure cases nothing is written.
#[instrument(skip(state, current, request), fields(user_id = current.id, product_id = request.product_id))]
pub async fn create_order(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    request.validate()?;

    let ctx = state.data.context();
    let order = state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            let products = ProductsStorage::new();
            let mut product = match products.find_by_id(&tx_ctx, request.product_id).await {
                Ok(product) => product,
                Err(DbError::NotFound) => {
                    return Err(Error::NotFound {
                        resource: "Product".to_string(),
                        id: request.product_id.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            };

            if product.qty < request.qty {
                return Err(Error::Unprocessable {
                    message: format!("Insufficient stock: {} available, {} requested", product.qty, request.qty),
                });
            }

            product.qty -= request.qty;
            products.update(&tx_ctx, &mut product).await?;

            let mut order = OrderHistory {
                id: 0,
                user_id: current.id,
                product_id: product.id,
                qty: request.qty,
                price: product.price,
                created_at: Utc::now(),
                updated_at: None,
                deleted_at: None,
            };
            OrdersStorage::new().insert(&tx_ctx, &mut order).await?;
            Ok(order)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}
