//! Bridge protocol constants

use std::time::Duration;

use alloy_sol_types::sol;
use swap_core::Blockchain;

sol! {
    /// Swap contract deployed on each side of a bridge route
    #[derive(Debug, PartialEq, Eq)]
    interface IRubicCrossChain {
        function transferToOtherBlockchain(uint256 blockchain, uint256 amount, string newAddress) external;
    }
}

/// Fee selection pivots on whether the destination is this chain
pub const FEE_PRIMARY_CHAIN: Blockchain = Blockchain::Ethereum;

/// Budget for the networks endpoint before degrading to no pairs
pub const NETWORKS_TIMEOUT: Duration = Duration::from_millis(3000);

/// Transaction type recorded with the bridge backend
pub const BRIDGE_TRANSACTION_KIND: &str = "swap_rbc";

/// Chain identifier the swap contracts use for the destination
pub fn destination_index(chain: Blockchain) -> Option<u64> {
    match chain {
        Blockchain::BinanceSmartChain | Blockchain::BinanceSmartChainTestnet => Some(1),
        Blockchain::Ethereum => Some(2),
        Blockchain::Polygon => Some(3),
        _ => None,
    }
}
