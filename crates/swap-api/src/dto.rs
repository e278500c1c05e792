//! Data Transfer Objects for API requests and responses

use alloy_primitives::Address;
use axum::{http::StatusCode, Json};
use instant_trade::TradeToken;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use swap_core::Blockchain;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub net_mode: String,
}

impl HealthResponse {
    pub fn new(net_mode: &str) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            net_mode: net_mode.to_string(),
        }
    }
}

/// Bridge fee quote request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeFeeRequest {
    pub symbol: String,
    pub from_chain: Blockchain,
    pub to_chain: Blockchain,
    pub amount: Decimal,
}

/// Reload staking figures, optionally for a wallet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingRefreshRequest {
    #[serde(default)]
    pub wallet: Option<Address>,
}

/// Amount of xBRBC (leave reward) or BRBC (USD price), in token units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRewardResponse {
    pub amount: Decimal,
    pub reward: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdPriceResponse {
    pub amount: Decimal,
    /// `None` until a token price has been fetched
    pub usd_price: Option<Decimal>,
}

/// Instant-trade quote request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapQuoteRequest {
    pub blockchain: Blockchain,
    pub from: TradeToken,
    pub to: TradeToken,
    pub amount: Decimal,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Error half of every handler result
pub type ApiFailure = (StatusCode, Json<ApiError>);

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    /// Status and body for a workspace error
    pub fn from_error(e: &swap_core::Error) -> ApiFailure {
        (
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(Self::new(e.error_code(), e.to_string())),
        )
    }

    pub fn unavailable(code: &str, message: impl Into<String>) -> ApiFailure {
        (StatusCode::SERVICE_UNAVAILABLE, Json(Self::new(code, message)))
    }
}
