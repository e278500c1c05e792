//! Bridge endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use bridge::{BridgeFeeInfo, BridgeState};

use crate::dto::{ApiError, ApiFailure, BridgeFeeRequest};
use crate::AppState;

/// Create bridge routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pairs", get(get_pairs))
        .route("/fee", post(get_fee))
}

/// GET /bridge/pairs - Every loaded pair, both directions
pub async fn get_pairs(State(state): State<AppState>) -> Json<BridgeState> {
    Json(state.bridges().state())
}

/// POST /bridge/fee - Fee and receiving amount for a transfer
pub async fn get_fee(
    State(state): State<AppState>,
    Json(request): Json<BridgeFeeRequest>,
) -> Result<Json<BridgeFeeInfo>, ApiFailure> {
    let pair = state
        .bridges()
        .find_pair(&request.symbol, request.from_chain, request.to_chain)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::not_found(format!(
                    "No {} pair for {} -> {}",
                    request.symbol, request.from_chain, request.to_chain
                ))),
            )
        })?;

    Ok(Json(BridgeFeeInfo::quote(
        &pair,
        request.from_chain,
        request.to_chain,
        request.amount,
    )))
}
