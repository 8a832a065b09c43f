//! Order CRUD handlers.
//!
//! # Endpoints
//!
//! - `POST /order`                                  – create a pending order
//! - `GET  /order/{tx_id}`                          – fetch orders for a tx id
//! - `GET  /orders/{address}/{asset}/{offset}/{size}` – paged listing
//!
//! Orders created here carry a null `confirmed_at`; confirmation is the
//! reconciliation engine's job once the transaction lands on chain.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use ordersync_core::entities::order::{NewOrder, Order};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::state::AppState;

/// Largest page size the listing endpoint will serve.
const MAX_PAGE_SIZE: i64 = 100;

/// Build the order API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order", post(create_order))
        .route("/order/{tx_id}", get(get_order))
        .route("/orders/{address}/{asset}/{offset}/{size}", get(list_orders))
}

/// Request body for creating a pending order.
#[derive(Debug, Deserialize)]
struct CreateOrderRequest {
    tx: String,
    from: String,
    to: String,
    asset: String,
    value: Decimal,
}

/// `POST /order` — create a new pending order.
async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, OrderApiError> {
    NewOrder {
        tx_id: payload.tx,
        from_address: payload.from,
        to_address: payload.to,
        asset: payload.asset,
        value: payload.value,
        block_height: 0,
        confirmed_at: None,
    }
    .insert(&state.db)
    .await
    .map_err(OrderApiError::Database)?;

    Ok(StatusCode::CREATED)
}

/// `GET /order/{tx_id}` — fetch all order rows for a tx id.
async fn get_order(
    State(state): State<AppState>,
    Path(tx_id): Path<String>,
) -> Result<impl IntoResponse, OrderApiError> {
    let orders = Order::by_tx_id(&state.db, &tx_id)
        .await
        .map_err(OrderApiError::Database)?;

    if orders.is_empty() {
        return Err(OrderApiError::NotFound);
    }
    Ok(Json(orders))
}

/// `GET /orders/{address}/{asset}/{offset}/{size}` — paged order listing
/// for an address (matched against either side of the transfer).
async fn list_orders(
    State(state): State<AppState>,
    Path((address, asset, offset, size)): Path<(String, String, i64, i64)>,
) -> Result<impl IntoResponse, OrderApiError> {
    let offset = offset.max(0);
    let size = size.clamp(1, MAX_PAGE_SIZE);

    let orders = Order::list_for_address(&state.db, &address, &asset, offset, size)
        .await
        .map_err(OrderApiError::Database)?;

    Ok(Json(orders))
}

/// Errors that can occur in order API handlers.
#[derive(Debug)]
enum OrderApiError {
    /// A database query failed.
    Database(sqlx::Error),
    /// No orders exist for the requested tx id.
    NotFound,
}

impl IntoResponse for OrderApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            OrderApiError::Database(e) => {
                tracing::error!(error = %e, "Order API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            OrderApiError::NotFound => (StatusCode::NOT_FOUND, "order not found").into_response(),
        }
    }
}
