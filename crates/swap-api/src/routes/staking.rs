//! Staking endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use staking::{StakingService, StakingState};
use swap_core::WalletContext;

use crate::dto::{
    AmountRequest, ApiError, ApiFailure, LeaveRewardResponse, StakingRefreshRequest,
    UsdPriceResponse,
};
use crate::AppState;

/// Create staking routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/state", get(get_state))
        .route("/refresh", post(refresh))
        .route("/leave-reward", post(leave_reward))
        .route("/usd-price", post(usd_price))
}

fn staking(state: &AppState) -> Result<Arc<StakingService>, ApiFailure> {
    state
        .staking()
        .cloned()
        .ok_or_else(|| ApiError::unavailable("staking_disabled", "Staking is not configured"))
}

/// GET /staking/state - Latest published figures
pub async fn get_state(State(state): State<AppState>) -> Result<Json<StakingState>, ApiFailure> {
    Ok(Json(staking(&state)?.snapshot()))
}

/// POST /staking/refresh - Reload pool figures, and the wallet's when given
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<StakingRefreshRequest>,
) -> Result<Json<StakingState>, ApiFailure> {
    let service = staking(&state)?;
    let wallet = request.wallet.map(WalletContext::new);

    service.reload_progress(wallet.as_ref()).await;
    service.reload_statistics(wallet.as_ref()).await;
    if let Some(wallet) = &wallet {
        service.refresh_max_withdraw(wallet).await;
    }

    Ok(Json(service.snapshot()))
}

/// POST /staking/leave-reward - BRBC received for redeeming an xBRBC amount
pub async fn leave_reward(
    State(state): State<AppState>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<LeaveRewardResponse>, ApiFailure> {
    let reward = staking(&state)?
        .calculate_leave_reward(request.amount)
        .await
        .map_err(|e| ApiError::from_error(&e))?;

    Ok(Json(LeaveRewardResponse {
        amount: request.amount,
        reward,
    }))
}

/// POST /staking/usd-price - USD value of a BRBC amount at the last known price
pub async fn usd_price(
    State(state): State<AppState>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<UsdPriceResponse>, ApiFailure> {
    Ok(Json(UsdPriceResponse {
        amount: request.amount,
        usd_price: staking(&state)?.calculate_usd_price(request.amount),
    }))
}
