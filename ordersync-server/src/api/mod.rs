//! HTTP surface.
//!
//! Thin I/O plumbing around the engine:
//!
//! - wallet registration CRUD (`/wallet/...`)
//! - order creation and lookup (`/order`, `/orders/...`)
//! - the event ingest bridge (`/tx/{tx_id}`) feeding the watcher pool

mod ingest;
mod orders;
mod wallets;

use crate::state::AppState;
use axum::Router;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(wallets::router())
        .merge(orders::router())
        .merge(ingest::router())
}
