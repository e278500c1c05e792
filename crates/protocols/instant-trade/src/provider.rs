//! Uniswap V2 router provider
//!
//! Quotes every candidate path (direct, plus one hop through each routing
//! token) in a single multicall of `getAmountsOut` and keeps the path with
//! the largest output.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, U256};
use chain_adapter::{decode_returns, AllowanceManager, AllowanceRequest, ChainAdapters, ContractCall};
use rust_decimal::Decimal;
use swap_core::{
    from_smallest_unit, to_smallest_unit, OnTransactionHash, ProtocolError, Result, TxReceipt,
    WalletContext,
};

use crate::config::ProviderConfig;
use crate::router::{ISolarbeamRouter, IUniswapV2Router};
use crate::trade::{min_amount_out, InstantTrade, TradeSide, TradeToken};

pub struct UniswapV2Provider {
    config: ProviderConfig,
    adapters: ChainAdapters,
    allowances: Arc<AllowanceManager>,
}

impl UniswapV2Provider {
    pub fn new(config: ProviderConfig, adapters: ChainAdapters, allowances: Arc<AllowanceManager>) -> Self {
        Self {
            config,
            adapters,
            allowances,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Direct path first, then one hop through each routing token
    pub fn candidate_paths(&self, from: Address, to: Address) -> Vec<Vec<Address>> {
        std::iter::once(vec![from, to])
            .chain(
                self.config
                    .routing_tokens
                    .iter()
                    .filter(|&&hop| hop != from && hop != to)
                    .map(|&hop| vec![from, hop, to]),
            )
            .collect()
    }

    pub fn amounts_out_call(&self, amount_in: U256, path: &[Address]) -> ContractCall {
        let path = path.to_vec();
        match self.config.amounts_out_fee {
            Some(fee) => ContractCall::new(ISolarbeamRouter::getAmountsOutCall {
                amountIn: amount_in,
                path,
                fee,
            }),
            None => ContractCall::new(IUniswapV2Router::getAmountsOutCall {
                amountIn: amount_in,
                path,
            }),
        }
    }

    /// Output amounts along the path, last one being the quote
    pub fn decode_amounts_out(&self, output: &[u8]) -> Result<Vec<U256>> {
        let amounts = match self.config.amounts_out_fee {
            Some(_) => decode_returns::<ISolarbeamRouter::getAmountsOutCall>(output)?.amounts,
            None => decode_returns::<IUniswapV2Router::getAmountsOutCall>(output)?.amounts,
        };
        Ok(amounts)
    }

    pub fn swap_call(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        recipient: Address,
        deadline: u64,
    ) -> ContractCall {
        ContractCall::new(IUniswapV2Router::swapExactTokensForTokensCall {
            amountIn: amount_in,
            amountOutMin: amount_out_min,
            path: path.to_vec(),
            to: recipient,
            deadline: U256::from(deadline),
        })
    }

    /// Quote `amount` of `from` into `to` over the best available path
    pub async fn calculate_trade(
        &self,
        from: &TradeToken,
        to: &TradeToken,
        amount: Decimal,
    ) -> Result<InstantTrade> {
        if amount <= Decimal::ZERO {
            return Err(ProtocolError::InvalidAmount {
                message: format!("{} must be greater than zero", amount),
            }
            .into());
        }
        let no_route = || ProtocolError::NoRoute {
            from: from.symbol.clone(),
            to: to.symbol.clone(),
        };
        if from.address == to.address {
            return Err(no_route().into());
        }

        let amount_in = to_smallest_unit(amount, from.decimals)?;
        let paths = self.candidate_paths(from.address, to.address);
        let calls: Vec<ContractCall> = paths
            .iter()
            .map(|path| self.amounts_out_call(amount_in, path))
            .collect();

        let read = self.adapters.read(self.config.blockchain)?;
        let results = read
            .multicall_contract_methods(self.config.router, &calls)
            .await?;

        let best = paths
            .into_iter()
            .zip(results)
            .filter(|(_, result)| result.success)
            .filter_map(|(path, result)| {
                let amounts = self.decode_amounts_out(&result.return_data).ok()?;
                Some((path, *amounts.last()?))
            })
            .filter(|(_, out)| !out.is_zero())
            .max_by_key(|(_, out)| *out);

        let (path, amount_out) = best.ok_or_else(no_route)?;
        tracing::debug!(
            provider = %self.config.provider,
            hops = path.len() - 1,
            %amount_out,
            "Best route found"
        );

        Ok(InstantTrade {
            provider: self.config.provider,
            blockchain: self.config.blockchain,
            from: TradeSide {
                token: from.clone(),
                amount,
                units: amount_in,
            },
            to: TradeSide {
                token: to.clone(),
                amount: from_smallest_unit(amount_out, to.decimals)?,
                units: amount_out,
            },
            path,
            estimated_gas: self.config.gas_limit,
        })
    }

    /// Execute a quoted trade, approving the router first when needed
    pub async fn create_trade(
        &self,
        wallet: &WalletContext,
        trade: &InstantTrade,
        slippage: Decimal,
        deadline: Duration,
        on_hash: Option<OnTransactionHash>,
    ) -> Result<TxReceipt> {
        let amount_out_min =
            min_amount_out(trade.to.units, slippage).ok_or_else(|| ProtocolError::InvalidAmount {
                message: format!("slippage {} must be within [0, 1)", slippage),
            })?;
        let deadline = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .saturating_add(deadline)
            .as_secs();

        let read = self.adapters.read(self.config.blockchain)?;
        let write = self.adapters.write(self.config.blockchain)?;
        self.allowances
            .ensure_allowance(
                read.as_ref(),
                write.as_ref(),
                &AllowanceRequest {
                    chain: self.config.blockchain,
                    token: trade.from.token.address,
                    owner: wallet.address,
                    spender: self.config.router,
                    required: trade.from.units,
                },
            )
            .await?;

        let call = self.swap_call(
            trade.from.units,
            amount_out_min,
            &trade.path,
            wallet.address,
            deadline,
        );
        let receipt = write
            .try_execute_contract_method(self.config.router, &call, on_hash)
            .await?;
        tracing::info!(
            provider = %self.config.provider,
            from = %trade.from.token.symbol,
            to = %trade.to.token.symbol,
            tx_hash = %receipt.transaction_hash,
            "Instant trade confirmed"
        );
        Ok(receipt)
    }
}

impl std::fmt::Debug for UniswapV2Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniswapV2Provider")
            .field("provider", &self.config.provider)
            .field("blockchain", &self.config.blockchain)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy_primitives::address;
    use chain_adapter::{InMemoryChain, IERC20};
    use swap_core::{Blockchain, ChainError, Error, Journal};

    pub(crate) const USER: Address = address!("5555555555555555555555555555555555555555");
    pub(crate) const WMOVR: Address = address!("98878B06940aE243284CA214f92Bb71a2b032B8A");
    pub(crate) const USDC: Address = address!("E3F5a90F9cb311505cd691a46596599aA1A0AD7D");
    pub(crate) const SOLAR: Address = address!("6bD193Ee6D2104F14F94E2cA6efefae561A4334B");
    pub(crate) const RIB: Address = address!("bD90A6125a84E5C512129D622a75CDDFe45c1898");

    pub(crate) fn token(address: Address, symbol: &str) -> TradeToken {
        TradeToken {
            address,
            symbol: symbol.to_string(),
            decimals: 18,
        }
    }

    pub(crate) fn units(amount: u64) -> U256 {
        U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
    }

    pub(crate) fn provider(chain: Arc<InMemoryChain>) -> UniswapV2Provider {
        UniswapV2Provider::new(
            ProviderConfig::solarbeam(),
            ChainAdapters::new()
                .with_reader(chain.clone())
                .with_writer(chain),
            Arc::new(AllowanceManager::new()),
        )
    }

    /// SOLAR -> RIB quotes: no direct pool, 30 via WMOVR, 42 via USDC
    pub(crate) fn quoted_chain(journal: Journal) -> Arc<InMemoryChain> {
        let chain = Arc::new(
            InMemoryChain::new(Blockchain::Moonriver)
                .with_account(USER)
                .with_journal(journal),
        );
        let p = provider(chain.clone());
        chain.set_call_response(
            &p.amounts_out_call(units(10), &[SOLAR, WMOVR, RIB]),
            vec![units(10), units(3), units(30)],
        );
        chain.set_call_response(
            &p.amounts_out_call(units(10), &[SOLAR, USDC, RIB]),
            vec![units(10), units(5), units(42)],
        );
        chain
    }

    #[test]
    fn test_candidate_paths() {
        let p = provider(Arc::new(InMemoryChain::new(Blockchain::Moonriver)));
        assert_eq!(
            p.candidate_paths(SOLAR, RIB),
            vec![vec![SOLAR, RIB], vec![SOLAR, WMOVR, RIB], vec![SOLAR, USDC, RIB]]
        );
        // a routing token at either end is not used as a hop
        assert_eq!(
            p.candidate_paths(WMOVR, RIB),
            vec![vec![WMOVR, RIB], vec![WMOVR, USDC, RIB]]
        );
    }

    #[test]
    fn test_solarbeam_fee_argument() {
        let p = provider(Arc::new(InMemoryChain::new(Blockchain::Moonriver)));
        let call = p.amounts_out_call(U256::from(1u64), &[SOLAR, RIB]);
        assert_eq!(call.signature(), "getAmountsOut(uint256,address[],uint256)");
        let decoded = call.decode::<ISolarbeamRouter::getAmountsOutCall>().unwrap();
        assert_eq!(decoded.fee, U256::from(25u64));
        assert_eq!(decoded.path, vec![SOLAR, RIB]);
    }

    #[test]
    fn test_stock_router_call() {
        let p = UniswapV2Provider::new(
            ProviderConfig::trader_joe(),
            ChainAdapters::new(),
            Arc::new(AllowanceManager::new()),
        );
        let call = p.amounts_out_call(U256::from(1u64), &[SOLAR, RIB]);
        assert_eq!(call.signature(), "getAmountsOut(uint256,address[])");
        assert!(call.is::<IUniswapV2Router::getAmountsOutCall>());
        assert!(p.decode_amounts_out(&[0u8; 8]).is_err());
    }

    #[tokio::test]
    async fn test_best_route_wins() {
        let journal = Journal::new();
        let p = provider(quoted_chain(journal.clone()));

        let trade = p
            .calculate_trade(&token(SOLAR, "SOLAR"), &token(RIB, "RIB"), Decimal::from(10))
            .await
            .unwrap();
        assert_eq!(trade.path, vec![SOLAR, USDC, RIB]);
        assert_eq!(trade.to.amount, Decimal::from(42));
        assert_eq!(trade.from.units, units(10));
        // one batched read for all candidates
        assert_eq!(journal.entries(), vec!["read:multicall"]);
    }

    #[tokio::test]
    async fn test_no_route() {
        let p = provider(Arc::new(InMemoryChain::new(Blockchain::Moonriver)));
        let err = p
            .calculate_trade(&token(SOLAR, "SOLAR"), &token(RIB, "RIB"), Decimal::from(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::NoRoute { .. })));

        let err = p
            .calculate_trade(&token(SOLAR, "SOLAR"), &token(SOLAR, "SOLAR"), Decimal::from(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::NoRoute { .. })));
    }

    #[tokio::test]
    async fn test_create_trade() {
        let journal = Journal::new();
        let chain = quoted_chain(journal.clone());
        let p = provider(chain.clone());
        let trade = p
            .calculate_trade(&token(SOLAR, "SOLAR"), &token(RIB, "RIB"), Decimal::from(10))
            .await
            .unwrap();

        let receipt = p
            .create_trade(
                &WalletContext::new(USER),
                &trade,
                Decimal::new(5, 3),
                Duration::from_secs(1200),
                None,
            )
            .await
            .unwrap();
        assert!(receipt.status);
        assert_eq!(
            journal.entries(),
            vec![
                "read:multicall",
                "read:allowance",
                "send:approve",
                "receipt:approve",
                "simulate:swapExactTokensForTokens",
                "send:swapExactTokensForTokens",
                "receipt:swapExactTokensForTokens",
            ]
        );

        let approve = &chain.sent("approve")[0];
        assert_eq!(approve.contract, SOLAR);
        let approve_call = approve.call.decode::<IERC20::approveCall>().unwrap();
        assert_eq!(approve_call.spender, p.config().router);

        let swap = &chain.sent("swapExactTokensForTokens")[0];
        assert_eq!(swap.contract, p.config().router);
        let swap_call = swap
            .call
            .decode::<IUniswapV2Router::swapExactTokensForTokensCall>()
            .unwrap();
        assert_eq!(swap_call.amountIn, units(10));
        // 42 less 0.5%
        assert_eq!(
            swap_call.amountOutMin,
            units(42) * U256::from(9950u64) / U256::from(10_000u64)
        );
        assert_eq!(swap_call.path, vec![SOLAR, USDC, RIB]);
        assert_eq!(swap_call.to, USER);
    }

    #[tokio::test]
    async fn test_invalid_slippage_sends_nothing() {
        let chain = quoted_chain(Journal::new());
        let p = provider(chain.clone());
        let trade = p
            .calculate_trade(&token(SOLAR, "SOLAR"), &token(RIB, "RIB"), Decimal::from(10))
            .await
            .unwrap();
        let err = p
            .create_trade(&WalletContext::new(USER), &trade, Decimal::ONE, Duration::from_secs(60), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::InvalidAmount { .. })
        ));
        assert!(chain.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_reverting_swap() {
        let chain = quoted_chain(Journal::new());
        chain.revert("swapExactTokensForTokens");
        let p = provider(chain.clone());
        let trade = p
            .calculate_trade(&token(SOLAR, "SOLAR"), &token(RIB, "RIB"), Decimal::from(10))
            .await
            .unwrap();
        let err = p
            .create_trade(&WalletContext::new(USER), &trade, Decimal::ZERO, Duration::from_secs(60), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Chain(ChainError::Reverted { .. })));
        assert!(chain.sent("swapExactTokensForTokens").is_empty());
    }
}
