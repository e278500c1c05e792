//! Quoted trades

use alloy_primitives::{Address, U256};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use swap_core::Blockchain;

use crate::config::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeToken {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

/// One side of a trade; `amount` is in token units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSide {
    pub token: TradeToken,
    pub amount: Decimal,
    pub units: U256,
}

/// Best route found for a swap. `to.amount` excludes slippage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantTrade {
    pub provider: ProviderKind,
    pub blockchain: Blockchain,
    pub from: TradeSide,
    pub to: TradeSide,
    pub path: Vec<Address>,
    pub estimated_gas: u64,
}

const BPS: u64 = 10_000;

/// Minimum accepted output for `slippage` (a fraction, e.g. `0.005`)
pub fn min_amount_out(amount_out: U256, slippage: Decimal) -> Option<U256> {
    if slippage < Decimal::ZERO || slippage >= Decimal::ONE {
        return None;
    }
    let bps = (slippage * Decimal::from(BPS)).round().to_u64()?;
    Some(amount_out * U256::from(BPS - bps) / U256::from(BPS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_amount_out() {
        let out = U256::from(1_000_000u64);
        assert_eq!(min_amount_out(out, Decimal::ZERO), Some(out));
        assert_eq!(
            min_amount_out(out, Decimal::new(5, 3)),
            Some(U256::from(995_000u64))
        );
        assert_eq!(
            min_amount_out(out, Decimal::new(1, 1)),
            Some(U256::from(900_000u64))
        );
        assert_eq!(min_amount_out(out, Decimal::ONE), None);
        assert_eq!(min_amount_out(out, Decimal::new(-1, 2)), None);
    }
}
