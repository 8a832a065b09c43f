//! Wallet registration handlers.
//!
//! # Endpoints
//!
//! - `POST   /wallet/{address}/{owner}` – register a tracked wallet
//! - `DELETE /wallet/{address}/{owner}` – remove a wallet registration

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use ordersync_core::entities::wallet::Wallet;

use crate::state::AppState;

/// Build the wallet API router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/wallet/{address}/{owner}",
        post(create_wallet).delete(delete_wallet),
    )
}

/// `POST /wallet/{address}/{owner}` — register a wallet address.
///
/// Registering an already tracked address is a no-op.
async fn create_wallet(
    State(state): State<AppState>,
    Path((address, owner)): Path<(String, String)>,
) -> Result<impl IntoResponse, WalletApiError> {
    Wallet::create(&state.db, &address, &owner)
        .await
        .map_err(WalletApiError::Database)?;

    Ok(StatusCode::OK)
}

/// `DELETE /wallet/{address}/{owner}` — remove a wallet registration.
async fn delete_wallet(
    State(state): State<AppState>,
    Path((address, owner)): Path<(String, String)>,
) -> Result<impl IntoResponse, WalletApiError> {
    let deleted = Wallet::delete(&state.db, &address, &owner)
        .await
        .map_err(WalletApiError::Database)?;

    if deleted == 0 {
        return Err(WalletApiError::NotFound);
    }
    Ok(StatusCode::OK)
}

/// Errors that can occur in wallet API handlers.
#[derive(Debug)]
enum WalletApiError {
    /// A database query failed.
    Database(sqlx::Error),
    /// The wallet registration was not found.
    NotFound,
}

impl IntoResponse for WalletApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            WalletApiError::Database(e) => {
                tracing::error!(error = %e, "Wallet API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            WalletApiError::NotFound => {
                (StatusCode::NOT_FOUND, "wallet not found").into_response()
            }
        }
    }
}
