//! Serializable state types for frontend communication

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use swap_core::TxReceipt;

/// Latest staking figures. Amounts are in token units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingState {
    pub amount_with_rewards: Decimal,
    pub apr: Decimal,
    pub refill_time: String,
    pub user_entered_amount: Decimal,
    pub total_entered: Decimal,
    pub staking_token_balance: Decimal,
    pub earned_rewards: Decimal,
    pub max_withdraw: Decimal,
    pub users_total_deposit: Decimal,
    pub selected_token_balance: Decimal,
    /// `None` until the first price refresh succeeds
    pub token_price: Option<Decimal>,
    pub progress_loading: bool,
    pub statistics_loading: bool,
}

/// How a stake entered the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "receipt")]
pub enum StakeEntry {
    /// `enter` called on the native chain
    Direct(TxReceipt),
    /// Tokens bridged to the staking contract; the receipt is the source-chain transfer
    Bridged(TxReceipt),
}

impl StakeEntry {
    pub fn receipt(&self) -> &TxReceipt {
        match self {
            Self::Direct(receipt) | Self::Bridged(receipt) => receipt,
        }
    }
}
