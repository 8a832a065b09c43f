//! Event ingest bridge.
//!
//! # Endpoints
//!
//! - `POST /tx/{tx_id}` – notify the watcher pool of a confirmed transaction
//!
//! The upstream indexer (or a queue-consumer sidecar) calls this after
//! writing the transaction row. The handler assigns the next stream offset
//! and pushes the event into the watcher's channel source; reconciliation
//! itself happens asynchronously in the pool.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Serialize;

use crate::state::AppState;

/// Build the ingest API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/tx/{tx_id}", post(ingest_tx))
}

/// Response for an accepted event.
#[derive(Serialize)]
struct IngestResponse {
    offset: i64,
}

/// `POST /tx/{tx_id}` — enqueue a transaction event for reconciliation.
async fn ingest_tx(
    State(state): State<AppState>,
    Path(tx_id): Path<String>,
) -> impl IntoResponse {
    match state.ingest.publish(tx_id).await {
        Some(offset) => (StatusCode::ACCEPTED, Json(IngestResponse { offset })).into_response(),
        None => {
            tracing::error!("event stream closed, rejecting ingest");
            (StatusCode::SERVICE_UNAVAILABLE, "watcher not running").into_response()
        }
    }
}
