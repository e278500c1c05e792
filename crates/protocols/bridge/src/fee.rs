//! Direction-dependent bridge fee

use rust_decimal::Decimal;
use swap_core::{Blockchain, TokenPair};

use crate::constants::FEE_PRIMARY_CHAIN;

/// Fixed fee for a transfer towards `to_chain`, in destination token units.
///
/// Not proportional to the amount. `None` when the backend reported no
/// figure for the selected side.
pub fn get_fee(pair: &TokenPair, to_chain: Blockchain) -> Option<Decimal> {
    if to_chain == FEE_PRIMARY_CHAIN {
        pair.to_fee
    } else {
        pair.from_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use swap_core::{PairSide, Token};

    fn side(chain: Blockchain, fee: Option<Decimal>) -> PairSide {
        PairSide {
            token: Token {
                blockchain: chain,
                address: Address::ZERO,
                symbol: "RBC".to_string(),
                name: "Rubic".to_string(),
                decimals: 18,
                min_amount: Decimal::ONE,
                max_amount: Decimal::from(1000),
            },
            swap_contract: Address::ZERO,
            fee,
        }
    }

    #[test]
    fn test_fee_by_direction() {
        let pair = TokenPair::new(
            "RBC",
            side(Blockchain::Ethereum, Some(Decimal::from(60))),
            side(Blockchain::BinanceSmartChain, Some(Decimal::from(2))),
        )
        .unwrap();

        assert_eq!(get_fee(&pair, Blockchain::Ethereum), Some(Decimal::from(2)));
        assert_eq!(
            get_fee(&pair, Blockchain::BinanceSmartChain),
            Some(Decimal::from(60))
        );
    }

    #[test]
    fn test_missing_fee_is_none() {
        let pair = TokenPair::new(
            "RBC",
            side(Blockchain::Polygon, None),
            side(Blockchain::BinanceSmartChain, Some(Decimal::ONE)),
        )
        .unwrap();
        assert_eq!(get_fee(&pair, Blockchain::BinanceSmartChain), None);
    }
}
