//! Serializable state types for frontend communication

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use swap_core::{Blockchain, TokenPair};

use crate::fee::get_fee;

/// Every loaded bridge pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeState {
    pub pairs: Vec<BridgePairInfo>,
}

/// One direction of a pair as the frontend shows it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgePairInfo {
    pub symbol: String,
    pub from_chain: Blockchain,
    pub to_chain: Blockchain,
    pub token_address: String,
    pub decimals: u8,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// `None` when the backend reported no fee for this direction
    pub fee: Option<Decimal>,
}

impl BridgePairInfo {
    /// Both directions of `pair`
    pub fn directions(pair: &TokenPair) -> Vec<Self> {
        [(pair.from_chain, pair.to_chain), (pair.to_chain, pair.from_chain)]
            .into_iter()
            .filter_map(|(from, to)| {
                let token = pair.token(from)?;
                Some(Self {
                    symbol: pair.symbol.clone(),
                    from_chain: from,
                    to_chain: to,
                    token_address: token.address.to_string(),
                    decimals: token.decimals,
                    min_amount: token.min_amount,
                    max_amount: token.max_amount,
                    fee: get_fee(pair, to),
                })
            })
            .collect()
    }
}

/// Fee quote for a transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeFeeInfo {
    pub symbol: String,
    pub from_chain: Blockchain,
    pub to_chain: Blockchain,
    pub fee: Option<Decimal>,
    /// Amount arriving on the destination chain, when the fee is known
    pub receiving_amount: Option<Decimal>,
}

impl BridgeFeeInfo {
    pub fn quote(pair: &TokenPair, from: Blockchain, to: Blockchain, amount: Decimal) -> Self {
        let fee = get_fee(pair, to);
        Self {
            symbol: pair.symbol.clone(),
            from_chain: from,
            to_chain: to,
            fee,
            receiving_amount: fee.map(|fee| (amount - fee).max(Decimal::ZERO)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::build_pair;
    use crate::provider::tests::networks;
    use swap_core::BridgeConfig;

    #[test]
    fn test_directions() {
        let config = BridgeConfig::default();
        let pair = build_pair(&config.routes[0], &networks()).unwrap();
        let infos = BridgePairInfo::directions(&pair);

        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].from_chain, Blockchain::Ethereum);
        // fee to BSC is the source-side figure, fee to Ethereum the destination-side one
        assert_eq!(infos[0].fee, Some(Decimal::from(60)));
        assert_eq!(infos[1].from_chain, Blockchain::BinanceSmartChain);
        assert_eq!(infos[1].fee, Some(Decimal::from(2)));
        assert_eq!(infos[1].max_amount, Decimal::from(100_000));
    }

    #[test]
    fn test_fee_quote() {
        let config = BridgeConfig::default();
        let pair = build_pair(&config.routes[0], &networks()).unwrap();
        let quote = BridgeFeeInfo::quote(
            &pair,
            Blockchain::Ethereum,
            Blockchain::BinanceSmartChain,
            Decimal::from(100),
        );
        assert_eq!(quote.receiving_amount, Some(Decimal::from(40)));

        let mut no_fee = pair.clone();
        no_fee.from_fee = None;
        let quote = BridgeFeeInfo::quote(
            &no_fee,
            Blockchain::Ethereum,
            Blockchain::BinanceSmartChain,
            Decimal::from(100),
        );
        assert_eq!(quote.fee, None);
        assert_eq!(quote.receiving_amount, None);

        let json = serde_json::to_value(&quote).unwrap();
        assert!(json["fee"].is_null());
        assert_eq!(json["fromChain"], "ethereum");
    }
}
