//! Request and response bodies exchanged with the backend

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One entry of the bridge networks endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeNetworkInfo {
    pub min_amount: Decimal,
    pub token_address: String,
    pub swap_address: String,
    #[serde(default)]
    pub fee: Option<Decimal>,
    /// Backend chain name, e.g. `binance-smart-chain` or the legacy `matic`
    pub network: String,
}

/// Transfer submitted on the source chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTransactionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "fromNetwork")]
    pub from_network: String,
    pub transaction_id: String,
    /// Smallest units, decimal string
    pub amount: String,
    pub user: Address,
}

/// Completed transfer reported to the bridge bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeBotNotice {
    pub from_network: String,
    pub to_network: String,
    pub symbol: String,
    pub from_amount: Decimal,
    pub transaction_hash: String,
    pub wallet_address: Address,
}

/// Staking deposit change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRecord {
    pub wallet_address: Address,
    /// Smallest units, decimal string
    pub amount: String,
    pub tx_hash: String,
    pub network: String,
}

impl DepositRecord {
    pub fn new(
        wallet_address: Address,
        amount: U256,
        tx_hash: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            wallet_address,
            amount: amount.to_string(),
            tx_hash: tx_hash.into(),
            network: network.into(),
        }
    }

    pub fn amount_units(&self) -> U256 {
        U256::from_str(&self.amount).unwrap_or_default()
    }
}

/// Source-chain hash of a stake-via-bridge transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeTxHashNotice {
    pub tx_hash: String,
    pub network: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AprResponse {
    pub apr: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RefillTimeResponse {
    pub refill_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DepositResponse {
    /// Smallest units; the backend sends either a number or a string
    pub deposit: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BridgeContractResponse {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenPriceResponse {
    pub usd_price: Decimal,
}

/// Signed sign-in challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedNonce {
    pub address: Address,
    pub message: String,
    pub signed_msg: String,
}

/// Backend user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Wallet address the session was opened with
    pub username: String,
}

impl UserProfile {
    /// Whether this profile belongs to `address`
    pub fn is_for(&self, address: Address) -> bool {
        Address::from_str(&self.username).is_ok_and(|a| a == address)
    }
}
