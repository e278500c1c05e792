//! Rubic cross-chain token bridge
//!
//! Moves a token between two EVM chains by calling
//! `transferToOtherBlockchain` on the source chain's swap contract. Relayers
//! settle on the destination chain; this crate only submits and confirms
//! the source-side transaction and reports it to the ledger backend.
//!
//! Each configured route gets one [`RubicBridge`]; [`BridgeService`] picks
//! the bridge serving a given direction.

pub mod config;
pub mod constants;
pub mod fee;
pub mod provider;
pub mod state;
pub mod validate;

use std::sync::Arc;

use chain_adapter::{AllowanceManager, ChainAdapters};
use futures::future::join_all;
use ledger_client::LedgerBackend;
use swap_core::{Blockchain, BridgeConfig, ErrorReporter, ProtocolError, TokenPair};

pub use config::{build_pair, load_token_pairs};
pub use constants::{destination_index, IRubicCrossChain, FEE_PRIMARY_CHAIN, NETWORKS_TIMEOUT};
pub use fee::get_fee;
pub use provider::{transfer_call, RubicBridge};
pub use state::{BridgeFeeInfo, BridgePairInfo, BridgeState};
pub use validate::{validate_destination_address, validate_request};

/// All configured bridge routes
#[derive(Debug)]
pub struct BridgeService {
    bridges: Vec<Arc<RubicBridge>>,
}

impl BridgeService {
    pub fn new(
        config: &BridgeConfig,
        adapters: ChainAdapters,
        ledger: Arc<dyn LedgerBackend>,
        allowances: Arc<AllowanceManager>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let bridges = config
            .routes
            .iter()
            .map(|route| {
                Arc::new(RubicBridge::new(
                    route.clone(),
                    adapters.clone(),
                    Arc::clone(&ledger),
                    Arc::clone(&allowances),
                    Arc::clone(&reporter),
                ))
            })
            .collect();
        Self { bridges }
    }

    pub fn bridges(&self) -> &[Arc<RubicBridge>] {
        &self.bridges
    }

    /// Bridge serving `from -> to`
    pub fn bridge_for(&self, from: Blockchain, to: Blockchain) -> Result<Arc<RubicBridge>, ProtocolError> {
        self.bridges
            .iter()
            .find(|b| b.serves(from, to))
            .cloned()
            .ok_or(ProtocolError::UnsupportedRoute { from, to })
    }

    /// Load every route's pairs concurrently
    pub async fn load_all(&self) -> usize {
        let loaded: usize = join_all(self.bridges.iter().map(|b| b.load_pairs()))
            .await
            .iter()
            .map(Vec::len)
            .sum();
        tracing::info!(routes = self.bridges.len(), pairs = loaded, "Bridge pairs loaded");
        loaded
    }

    pub fn all_pairs(&self) -> Vec<TokenPair> {
        self.bridges.iter().flat_map(|b| b.pairs()).collect()
    }

    /// Loaded pair with `symbol` serving `from -> to`
    pub fn find_pair(&self, symbol: &str, from: Blockchain, to: Blockchain) -> Option<TokenPair> {
        self.bridge_for(from, to).ok()?.pair(symbol)
    }

    pub fn state(&self) -> BridgeState {
        BridgeState {
            pairs: self
                .all_pairs()
                .iter()
                .flat_map(BridgePairInfo::directions)
                .collect(),
        }
    }
}
