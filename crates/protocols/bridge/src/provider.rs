//! Transfer orchestration for one bridge route
//!
//! `create_trade` runs a fixed sequence:
//! 1. validate the request against its pair
//! 2. ensure the swap contract may spend the amount (approve if not)
//! 3. submit `transferToOtherBlockchain` and take the hash
//! 4. hand the hash to the caller's callback
//! 5. record the transfer with the ledger (detached)
//! 6. wait for the receipt
//! 7. notify the bridge bot (detached)
//!
//! Detached ledger calls never fail the transfer; their faults go to the
//! [`ErrorReporter`]. Nothing is retried.

use std::sync::Arc;

use alloy_primitives::{Address, TxHash, U256};
use chain_adapter::{AllowanceManager, AllowanceRequest, ChainAdapters, ContractCall};
use ledger_client::{BridgeBotNotice, BridgeTransactionRecord, LedgerBackend};
use rust_decimal::Decimal;
use swap_core::{
    to_smallest_unit, Blockchain, BridgeRouteConfig, ErrorReporter, ProtocolError, Published,
    Result, TokenPair, TransferRequest, TxReceipt, WalletContext,
};
use tokio::sync::watch;

use crate::config::load_token_pairs;
use crate::constants::{destination_index, IRubicCrossChain, BRIDGE_TRANSACTION_KIND};
use crate::fee::get_fee;
use crate::validate::validate_request;

/// A validated request resolved against its pair
#[derive(Debug, Clone)]
struct PreparedTransfer {
    token: Address,
    swap_contract: Address,
    amount_units: U256,
    destination: u64,
}

impl PreparedTransfer {
    fn allowance_request(&self, chain: Blockchain, owner: Address) -> AllowanceRequest {
        AllowanceRequest {
            chain,
            token: self.token,
            owner,
            spender: self.swap_contract,
            required: self.amount_units,
        }
    }
}

/// `transferToOtherBlockchain(destination, amount, to_address)`
pub fn transfer_call(destination: u64, amount_units: U256, to_address: &str) -> ContractCall {
    ContractCall::new(IRubicCrossChain::transferToOtherBlockchainCall {
        blockchain: U256::from(destination),
        amount: amount_units,
        newAddress: to_address.to_string(),
    })
}

pub struct RubicBridge {
    route: BridgeRouteConfig,
    pairs: Published<Vec<TokenPair>>,
    adapters: ChainAdapters,
    ledger: Arc<dyn LedgerBackend>,
    allowances: Arc<AllowanceManager>,
    reporter: Arc<dyn ErrorReporter>,
}

impl RubicBridge {
    pub fn new(
        route: BridgeRouteConfig,
        adapters: ChainAdapters,
        ledger: Arc<dyn LedgerBackend>,
        allowances: Arc<AllowanceManager>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            route,
            pairs: Published::new(Vec::new()),
            adapters,
            ledger,
            allowances,
            reporter,
        }
    }

    pub fn route(&self) -> &BridgeRouteConfig {
        &self.route
    }

    /// Whether `from -> to` is this route in either direction
    pub fn serves(&self, from: Blockchain, to: Blockchain) -> bool {
        let (a, b) = (self.route.from.blockchain, self.route.to.blockchain);
        (from == a && to == b) || (from == b && to == a)
    }

    /// Refresh the published pairs from the networks endpoint
    pub async fn load_pairs(&self) -> Vec<TokenPair> {
        let pairs = load_token_pairs(self.ledger.as_ref(), &self.route).await;
        self.pairs.set(pairs.clone());
        pairs
    }

    pub fn pairs(&self) -> Vec<TokenPair> {
        self.pairs.get()
    }

    pub fn subscribe_pairs(&self) -> watch::Receiver<Vec<TokenPair>> {
        self.pairs.subscribe()
    }

    /// Loaded pair with the given symbol
    pub fn pair(&self, symbol: &str) -> Option<TokenPair> {
        self.pairs.get().into_iter().find(|p| p.symbol == symbol)
    }

    pub fn get_fee(&self, pair: &TokenPair, to_chain: Blockchain) -> Option<Decimal> {
        get_fee(pair, to_chain)
    }

    fn prepare(&self, request: &TransferRequest) -> std::result::Result<PreparedTransfer, ProtocolError> {
        let unsupported = || ProtocolError::UnsupportedRoute {
            from: request.from_chain,
            to: request.to_chain,
        };
        if !self.serves(request.from_chain, request.to_chain) {
            return Err(unsupported());
        }
        validate_request(request)?;

        let token = request.source_token().ok_or_else(unsupported)?;
        let swap_contract = request
            .pair
            .swap_contract(request.from_chain)
            .ok_or_else(|| ProtocolError::StateUnavailable {
                reason: format!("no swap contract for {}", request.from_chain),
            })?;
        let destination = destination_index(request.to_chain).ok_or_else(unsupported)?;

        Ok(PreparedTransfer {
            token: token.address,
            swap_contract,
            amount_units: to_smallest_unit(request.amount, token.decimals)?,
            destination,
        })
    }

    /// Whether the swap contract still needs an approval for this transfer
    pub async fn needs_approval(&self, wallet: &WalletContext, request: &TransferRequest) -> Result<bool> {
        let prepared = self.prepare(request)?;
        let read = self.adapters.read(request.from_chain)?;
        let needed = chain_adapter::needs_approval(
            read.as_ref(),
            &prepared.allowance_request(request.from_chain, wallet.address),
        )
        .await?;
        Ok(needed)
    }

    /// Approve the swap contract for an unlimited amount.
    ///
    /// Refused when the current allowance already covers the transfer.
    pub async fn approve(&self, wallet: &WalletContext, request: &TransferRequest) -> Result<TxReceipt> {
        if !self.needs_approval(wallet, request).await? {
            return Err(ProtocolError::ActionNotAllowed {
                reason: "allowance already covers the transfer".to_string(),
            }
            .into());
        }

        let prepared = self.prepare(request)?;
        let write = self.adapters.write(request.from_chain)?;
        let receipt = self
            .allowances
            .approve(
                write.as_ref(),
                &prepared.allowance_request(request.from_chain, wallet.address),
                request.on_transaction_hash.clone(),
            )
            .await?;
        Ok(receipt)
    }

    /// Run a transfer to completion and return its receipt
    pub async fn create_trade(&self, wallet: &WalletContext, request: &TransferRequest) -> Result<TxReceipt> {
        let prepared = self.prepare(request)?;
        let read = self.adapters.read(request.from_chain)?;
        let write = self.adapters.write(request.from_chain)?;

        self.allowances
            .ensure_allowance(
                read.as_ref(),
                write.as_ref(),
                &prepared.allowance_request(request.from_chain, wallet.address),
            )
            .await?;

        let call = transfer_call(
            prepared.destination,
            prepared.amount_units,
            &request.to_address,
        );
        let tx_hash = write
            .send_contract_method(prepared.swap_contract, &call)
            .await?;
        tracing::info!(
            from = %request.from_chain,
            to = %request.to_chain,
            amount = %request.amount,
            %tx_hash,
            "Bridge transfer submitted"
        );

        if let Some(on_hash) = &request.on_transaction_hash {
            on_hash(tx_hash);
        }
        self.spawn_record_transaction(request.from_chain, tx_hash, prepared.amount_units, wallet.address);

        let receipt = write.confirm(tx_hash).await.map_err(|e| {
            tracing::warn!(%tx_hash, error = %e, "Bridge transfer failed");
            e
        })?;
        tracing::info!(%tx_hash, block = ?receipt.block_number, "Bridge transfer confirmed");

        self.spawn_notify_bot(request, tx_hash, wallet.address);
        Ok(receipt)
    }

    fn spawn_record_transaction(&self, chain: Blockchain, tx_hash: TxHash, amount_units: U256, user: Address) {
        let record = BridgeTransactionRecord {
            kind: BRIDGE_TRANSACTION_KIND.to_string(),
            from_network: chain.backend_name().to_string(),
            transaction_id: tx_hash.to_string(),
            amount: amount_units.to_string(),
            user,
        };
        let ledger = Arc::clone(&self.ledger);
        let reporter = Arc::clone(&self.reporter);
        tokio::spawn(async move {
            if let Err(e) = ledger.post_bridge_transaction(&record).await {
                reporter.report("post_bridge_transaction", &e.into());
            }
        });
    }

    fn spawn_notify_bot(&self, request: &TransferRequest, tx_hash: TxHash, wallet: Address) {
        let notice = BridgeBotNotice {
            from_network: request.from_chain.backend_name().to_string(),
            to_network: request.to_chain.backend_name().to_string(),
            symbol: request.pair.symbol.clone(),
            from_amount: request.amount,
            transaction_hash: tx_hash.to_string(),
            wallet_address: wallet,
        };
        let ledger = Arc::clone(&self.ledger);
        let reporter = Arc::clone(&self.reporter);
        tokio::spawn(async move {
            if let Err(e) = ledger.notify_bridge_bot(&notice).await {
                reporter.report("notify_bridge_bot", &e.into());
            }
        });
    }
}

impl std::fmt::Debug for RubicBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RubicBridge")
            .field("from", &self.route.from.blockchain)
            .field("to", &self.route.to.blockchain)
            .field("pairs", &self.pairs.get().len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy_primitives::address;
    use chain_adapter::{InMemoryChain, IERC20};
    use ledger_client::{BridgeNetworkInfo, InMemoryLedger};
    use std::sync::Mutex;
    use swap_core::{BridgeConfig, ChainError, Error, Journal, INFINITE_ALLOWANCE};

    type TransferCall = IRubicCrossChain::transferToOtherBlockchainCall;

    pub(crate) const USER: Address = address!("5555555555555555555555555555555555555555");
    pub(crate) const ETH_SWAP: Address = address!("1111111111111111111111111111111111111111");
    pub(crate) const DEST: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f2bD08";

    #[derive(Default)]
    pub(crate) struct RecordingReporter {
        pub contexts: Mutex<Vec<String>>,
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&self, context: &str, _error: &Error) {
            self.contexts.lock().unwrap().push(context.to_string());
        }
    }

    pub(crate) fn networks() -> Vec<BridgeNetworkInfo> {
        let entry = |network: &str, swap: &str, min: i64, fee: i64| BridgeNetworkInfo {
            min_amount: Decimal::from(min),
            token_address: String::new(),
            swap_address: swap.to_string(),
            fee: Some(Decimal::from(fee)),
            network: network.to_string(),
        };
        vec![
            entry("ethereum", "0x1111111111111111111111111111111111111111", 10, 60),
            entry("binance-smart-chain", "0x2222222222222222222222222222222222222222", 10, 2),
            entry("polygon", "0x3333333333333333333333333333333333333333", 10, 5),
        ]
    }

    pub(crate) struct Fixture {
        pub journal: Journal,
        pub chain: Arc<InMemoryChain>,
        pub ledger: Arc<InMemoryLedger>,
        pub reporter: Arc<RecordingReporter>,
        pub bridge: RubicBridge,
    }

    pub(crate) async fn fixture(route_index: usize, source: Blockchain) -> Fixture {
        let journal = Journal::new();
        let chain = Arc::new(
            InMemoryChain::new(source)
                .with_account(USER)
                .with_journal(journal.clone()),
        );
        let ledger = Arc::new(InMemoryLedger::new().with_journal(journal.clone()));
        ledger.set_networks(networks());
        let reporter = Arc::new(RecordingReporter::default());

        let adapters = ChainAdapters::new()
            .with_reader(chain.clone())
            .with_writer(chain.clone());
        let bridge = RubicBridge::new(
            BridgeConfig::default().routes[route_index].clone(),
            adapters,
            ledger.clone(),
            Arc::new(AllowanceManager::new()),
            reporter.clone(),
        );
        bridge.load_pairs().await;
        // loading is not part of the asserted sequences
        assert_eq!(journal.entries(), vec!["ledger:fetch_bridge_networks"]);

        Fixture {
            journal,
            chain,
            ledger,
            reporter,
            bridge,
        }
    }

    pub(crate) fn request(bridge: &RubicBridge, from: Blockchain, to: Blockchain, amount: i64) -> TransferRequest {
        TransferRequest {
            from_chain: from,
            to_chain: to,
            pair: bridge.pairs()[0].clone(),
            amount: Decimal::from(amount),
            to_address: DEST.to_string(),
            on_transaction_hash: None,
        }
    }

    async fn settle(journal: &Journal, prefix: &str) {
        for _ in 0..10 {
            if journal.position(prefix).is_some() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_transfer_sequence_with_approval() {
        let f = fixture(0, Blockchain::Ethereum).await;
        let mut req = request(&f.bridge, Blockchain::Ethereum, Blockchain::BinanceSmartChain, 50);
        let journal = f.journal.clone();
        req.on_transaction_hash = Some(Arc::new(move |_| journal.record("callback")));

        let receipt = f
            .bridge
            .create_trade(&WalletContext::new(USER), &req)
            .await
            .unwrap();
        assert!(receipt.status);
        settle(&f.journal, "ledger:notify_bridge_bot").await;

        assert_eq!(
            f.journal.entries(),
            vec![
                "ledger:fetch_bridge_networks",
                "read:allowance",
                "send:approve",
                "receipt:approve",
                "send:transferToOtherBlockchain",
                "callback",
                "ledger:post_bridge_transaction",
                "receipt:transferToOtherBlockchain",
                "ledger:notify_bridge_bot",
            ]
        );

        let approve = &f.chain.sent("approve")[0];
        assert_eq!(approve.contract, f.bridge.route().from.token_address);
        assert_eq!(
            approve.call.decode::<IERC20::approveCall>().unwrap(),
            IERC20::approveCall {
                spender: ETH_SWAP,
                amount: INFINITE_ALLOWANCE,
            }
        );

        let transfer = &f.chain.sent("transferToOtherBlockchain")[0];
        assert_eq!(transfer.contract, ETH_SWAP);
        let fifty_units = U256::from(50u64) * U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(
            transfer.call.decode::<TransferCall>().unwrap(),
            TransferCall {
                blockchain: U256::from(1u64),
                amount: fifty_units,
                newAddress: DEST.to_string(),
            }
        );

        let record = &f.ledger.bridge_transactions()[0];
        assert_eq!(record.from_network, "ethereum");
        assert_eq!(record.amount, "50000000000000000000");
        assert_eq!(record.user, USER);
        assert_eq!(record.transaction_id, transfer.hash.to_string());

        let notice = &f.ledger.bot_notices()[0];
        assert_eq!(notice.to_network, "binance-smart-chain");
        assert_eq!(notice.from_amount, Decimal::from(50));
    }

    #[tokio::test]
    async fn test_sufficient_allowance_skips_approval() {
        let f = fixture(0, Blockchain::Ethereum).await;
        let token = f.bridge.route().from.token_address;
        f.chain.set_allowance(token, USER, ETH_SWAP, INFINITE_ALLOWANCE);

        let req = request(&f.bridge, Blockchain::Ethereum, Blockchain::BinanceSmartChain, 50);
        f.bridge
            .create_trade(&WalletContext::new(USER), &req)
            .await
            .unwrap();
        assert!(f.chain.sent("approve").is_empty());
        assert_eq!(f.chain.sent("transferToOtherBlockchain").len(), 1);
    }

    #[tokio::test]
    async fn test_ledger_failure_does_not_fail_transfer() {
        let f = fixture(0, Blockchain::Ethereum).await;
        f.ledger.fail("post_bridge_transaction");
        f.ledger.fail("notify_bridge_bot");

        let req = request(&f.bridge, Blockchain::Ethereum, Blockchain::BinanceSmartChain, 50);
        let receipt = f.bridge.create_trade(&WalletContext::new(USER), &req).await;
        assert!(receipt.is_ok());

        settle(&f.journal, "ledger:notify_bridge_bot").await;
        tokio::task::yield_now().await;
        let contexts = f.reporter.contexts.lock().unwrap().clone();
        assert!(contexts.contains(&"post_bridge_transaction".to_string()));
        assert!(contexts.contains(&"notify_bridge_bot".to_string()));
    }

    #[tokio::test]
    async fn test_reverted_transfer_is_a_fault() {
        let f = fixture(0, Blockchain::Ethereum).await;
        f.chain.revert("transferToOtherBlockchain");

        let req = request(&f.bridge, Blockchain::Ethereum, Blockchain::BinanceSmartChain, 50);
        let err = f
            .bridge
            .create_trade(&WalletContext::new(USER), &req)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Chain(ChainError::TransactionFailed { .. })
        ));
        // no retry
        assert_eq!(f.chain.sent("transferToOtherBlockchain").len(), 1);
        settle(&f.journal, "ledger:post_bridge_transaction").await;
        assert!(f.ledger.bot_notices().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_signature_stops_before_ledger() {
        let f = fixture(1, Blockchain::Polygon).await;
        f.chain.reject_sends("transferToOtherBlockchain");
        let token = f.bridge.route().from.token_address;
        f.chain.set_allowance(
            token,
            USER,
            address!("3333333333333333333333333333333333333333"),
            INFINITE_ALLOWANCE,
        );

        let req = request(&f.bridge, Blockchain::Polygon, Blockchain::BinanceSmartChain, 50);
        let err = f
            .bridge
            .create_trade(&WalletContext::new(USER), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Chain(ChainError::UserRejected)));
        tokio::task::yield_now().await;
        assert!(f.ledger.bridge_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_touches_nothing() {
        let f = fixture(0, Blockchain::Ethereum).await;
        let req = request(&f.bridge, Blockchain::Ethereum, Blockchain::BinanceSmartChain, 5);
        let err = f
            .bridge
            .create_trade(&WalletContext::new(USER), &req)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::BelowMinimum { .. })
        ));
        assert_eq!(f.journal.count("read:"), 0);
        assert!(f.chain.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_reverse_direction() {
        let f = fixture(0, Blockchain::BinanceSmartChain).await;
        let req = request(&f.bridge, Blockchain::BinanceSmartChain, Blockchain::Ethereum, 20);
        f.bridge
            .create_trade(&WalletContext::new(USER), &req)
            .await
            .unwrap();
        let transfer = &f.chain.sent("transferToOtherBlockchain")[0];
        assert_eq!(
            transfer.contract,
            address!("2222222222222222222222222222222222222222")
        );
        let decoded = transfer.call.decode::<TransferCall>().unwrap();
        assert_eq!(decoded.blockchain, U256::from(2u64));
    }

    #[tokio::test]
    async fn test_approve_flow() {
        let f = fixture(0, Blockchain::Ethereum).await;
        let wallet = WalletContext::new(USER);
        let req = request(&f.bridge, Blockchain::Ethereum, Blockchain::BinanceSmartChain, 50);

        assert!(f.bridge.needs_approval(&wallet, &req).await.unwrap());
        f.bridge.approve(&wallet, &req).await.unwrap();
        assert!(!f.bridge.needs_approval(&wallet, &req).await.unwrap());

        let err = f.bridge.approve(&wallet, &req).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::ActionNotAllowed { .. })
        ));
        assert_eq!(f.chain.sent("approve").len(), 1);
    }

    #[tokio::test]
    async fn test_wallet_not_connected() {
        let journal = Journal::new();
        let chain = Arc::new(InMemoryChain::new(Blockchain::Ethereum).with_journal(journal));
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.set_networks(networks());
        let bridge = RubicBridge::new(
            BridgeConfig::default().routes[0].clone(),
            ChainAdapters::new().with_reader(chain),
            ledger,
            Arc::new(AllowanceManager::new()),
            Arc::new(RecordingReporter::default()),
        );
        bridge.load_pairs().await;

        let req = request(&bridge, Blockchain::Ethereum, Blockchain::BinanceSmartChain, 50);
        let err = bridge
            .create_trade(&WalletContext::new(USER), &req)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Chain(ChainError::WalletNotConnected { .. })
        ));
    }
}
