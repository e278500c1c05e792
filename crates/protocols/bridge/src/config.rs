//! Token pair loading
//!
//! A route's configured token data is merged with the live figures from the
//! bridge networks endpoint (minimum amount, fee, swap contract fallback).

use std::str::FromStr;

use alloy_primitives::Address;
use ledger_client::{BridgeNetworkInfo, LedgerBackend};
use swap_core::{
    BridgeRouteConfig, BridgeSideConfig, Blockchain, PairSide, ProtocolError, Token, TokenPair,
};

use crate::constants::NETWORKS_TIMEOUT;

/// Fetch the networks list and build the route's pair.
///
/// Never fails: a timeout, a backend fault or a missing network entry is
/// logged and yields no pairs.
pub async fn load_token_pairs(
    ledger: &dyn LedgerBackend,
    route: &BridgeRouteConfig,
) -> Vec<TokenPair> {
    let networks = match tokio::time::timeout(NETWORKS_TIMEOUT, ledger.fetch_bridge_networks()).await
    {
        Ok(Ok(networks)) => networks,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Failed to fetch bridge networks");
            return Vec::new();
        }
        Err(_) => {
            tracing::warn!(
                "Bridge networks request timed out after {}ms",
                NETWORKS_TIMEOUT.as_millis()
            );
            return Vec::new();
        }
    };

    match build_pair(route, &networks) {
        Ok(pair) => {
            tracing::info!(
                symbol = %pair.symbol,
                from = %pair.from_chain,
                to = %pair.to_chain,
                "Loaded bridge pair"
            );
            vec![pair]
        }
        Err(e) => {
            tracing::warn!(
                from = %route.from.blockchain,
                to = %route.to.blockchain,
                error = %e,
                "Bridge route unavailable"
            );
            Vec::new()
        }
    }
}

/// Network entry for `chain`; names compare case-insensitively and the
/// legacy Polygon alias is accepted
pub fn find_network(networks: &[BridgeNetworkInfo], chain: Blockchain) -> Option<&BridgeNetworkInfo> {
    networks
        .iter()
        .find(|n| chain.matches_backend_name(&n.network))
}

pub fn build_pair(
    route: &BridgeRouteConfig,
    networks: &[BridgeNetworkInfo],
) -> Result<TokenPair, ProtocolError> {
    let from = pair_side(&route.from, networks)?;
    let to = pair_side(&route.to, networks)?;
    TokenPair::new(route.from.symbol.clone(), from, to)
}

fn pair_side(
    config: &BridgeSideConfig,
    networks: &[BridgeNetworkInfo],
) -> Result<PairSide, ProtocolError> {
    let network =
        find_network(networks, config.blockchain).ok_or_else(|| ProtocolError::StateUnavailable {
            reason: format!("no bridge network entry for {}", config.blockchain),
        })?;

    let swap_contract = match config.swap_contract {
        Some(address) => address,
        None => Address::from_str(&network.swap_address).map_err(|e| {
            ProtocolError::StateUnavailable {
                reason: format!(
                    "invalid swap contract '{}' for {}: {}",
                    network.swap_address, config.blockchain, e
                ),
            }
        })?,
    };

    Ok(PairSide {
        token: Token {
            blockchain: config.blockchain,
            address: config.token_address,
            symbol: config.symbol.clone(),
            name: config.name.clone(),
            decimals: config.decimals,
            min_amount: network.min_amount,
            max_amount: config.max_amount,
        },
        swap_contract,
        fee: network.fee,
    })
}
