//! Instant-trade endpoints

use axum::{extract::State, routing::post, Json, Router};

use instant_trade::InstantTrade;

use crate::dto::{ApiError, ApiFailure, SwapQuoteRequest};
use crate::AppState;

/// Create instant-trade routes
pub fn router() -> Router<AppState> {
    Router::new().route("/quote", post(quote))
}

/// POST /swap/quote - Best quote across the chain's providers
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<SwapQuoteRequest>,
) -> Result<Json<InstantTrade>, ApiFailure> {
    state
        .trades()
        .calculate_trade(request.blockchain, &request.from, &request.to, request.amount)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_error(&e))
}
