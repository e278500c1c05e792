//! Instant trades on Uniswap V2 forks
//!
//! Solarbeam (Moonriver), ViperSwap (Harmony) and Trader Joe (Avalanche)
//! share one [`UniswapV2Provider`]; per-router differences live in
//! [`ProviderConfig`].

pub mod config;
pub mod provider;
pub mod router;
pub mod trade;

use std::sync::Arc;

use chain_adapter::{AllowanceManager, ChainAdapters};
use futures::future::join_all;
use rust_decimal::Decimal;
use swap_core::{Blockchain, ProtocolError, Result};

pub use config::{ProviderConfig, ProviderKind, SOLARBEAM_FEE};
pub use provider::UniswapV2Provider;
pub use router::{ISolarbeamRouter, IUniswapV2Router};
pub use trade::{min_amount_out, InstantTrade, TradeSide, TradeToken};

/// Every configured provider, grouped by chain at lookup time
#[derive(Debug, Default)]
pub struct InstantTradeService {
    providers: Vec<UniswapV2Provider>,
}

impl InstantTradeService {
    pub fn new(configs: Vec<ProviderConfig>, adapters: ChainAdapters, allowances: Arc<AllowanceManager>) -> Self {
        let providers = configs
            .into_iter()
            .map(|config| UniswapV2Provider::new(config, adapters.clone(), Arc::clone(&allowances)))
            .collect();
        Self { providers }
    }

    pub fn providers_for(&self, chain: Blockchain) -> impl Iterator<Item = &UniswapV2Provider> {
        self.providers
            .iter()
            .filter(move |p| p.config().blockchain == chain)
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<&UniswapV2Provider> {
        self.providers.iter().find(|p| p.config().provider == kind)
    }

    /// Quote on every provider of `chain` and keep the largest output
    pub async fn calculate_trade(
        &self,
        chain: Blockchain,
        from: &TradeToken,
        to: &TradeToken,
        amount: Decimal,
    ) -> Result<InstantTrade> {
        let quotes = join_all(
            self.providers_for(chain)
                .map(|p| p.calculate_trade(from, to, amount)),
        )
        .await;

        let mut best: Option<InstantTrade> = None;
        let mut last_error = None;
        for quote in quotes {
            match quote {
                Ok(trade) => {
                    if best.as_ref().map_or(true, |b| trade.to.units > b.to.units) {
                        best = Some(trade);
                    }
                }
                Err(e) => {
                    tracing::debug!(%chain, error = %e, "Provider produced no quote");
                    last_error = Some(e);
                }
            }
        }

        match (best, last_error) {
            (Some(trade), _) => Ok(trade),
            (None, Some(e)) => Err(e),
            (None, None) => Err(ProtocolError::NoRoute {
                from: from.symbol.clone(),
                to: to.symbol.clone(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::{quoted_chain, token, RIB, SOLAR};
    use swap_core::{Error, Journal};

    #[tokio::test]
    async fn test_quote_by_chain() {
        let chain = quoted_chain(Journal::new());
        let service = InstantTradeService::new(
            ProviderConfig::defaults(),
            ChainAdapters::new().with_reader(chain),
            Arc::new(AllowanceManager::new()),
        );
        assert_eq!(service.providers_for(Blockchain::Moonriver).count(), 1);
        assert!(service.provider(ProviderKind::TraderJoe).is_some());

        let trade = service
            .calculate_trade(
                Blockchain::Moonriver,
                &token(SOLAR, "SOLAR"),
                &token(RIB, "RIB"),
                Decimal::from(10),
            )
            .await
            .unwrap();
        assert_eq!(trade.provider, ProviderKind::Solarbeam);
        assert_eq!(trade.to.amount, Decimal::from(42));

        let err = service
            .calculate_trade(
                Blockchain::Ethereum,
                &token(SOLAR, "SOLAR"),
                &token(RIB, "RIB"),
                Decimal::from(10),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::NoRoute { .. })));
    }
}
