//! Core type definitions

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, TxHash};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Blockchains known to the workspace.
///
/// The serialized form is the lower-case name the backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Blockchain {
    Ethereum,
    BinanceSmartChain,
    BinanceSmartChainTestnet,
    Polygon,
    Avalanche,
    Moonriver,
    Harmony,
}

/// Legacy backend name still reported for Polygon
pub const POLYGON_LEGACY_ALIAS: &str = "matic";

impl Blockchain {
    pub const ALL: [Blockchain; 7] = [
        Self::Ethereum,
        Self::BinanceSmartChain,
        Self::BinanceSmartChainTestnet,
        Self::Polygon,
        Self::Avalanche,
        Self::Moonriver,
        Self::Harmony,
    ];

    /// Name used by the backend API
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::BinanceSmartChain => "binance-smart-chain",
            Self::BinanceSmartChainTestnet => "binance-smart-chain-testnet",
            Self::Polygon => "polygon",
            Self::Avalanche => "avalanche",
            Self::Moonriver => "moonriver",
            Self::Harmony => "harmony",
        }
    }

    /// Resolve a backend network name (case-insensitive, `matic` maps to Polygon)
    pub fn from_backend_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        if name == POLYGON_LEGACY_ALIAS {
            return Some(Self::Polygon);
        }
        Self::ALL.into_iter().find(|c| c.backend_name() == name)
    }

    /// Whether a backend network name refers to this chain
    pub fn matches_backend_name(&self, name: &str) -> bool {
        Self::from_backend_name(name) == Some(*self)
    }

    /// EIP-155 chain id
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::BinanceSmartChain => 56,
            Self::BinanceSmartChainTestnet => 97,
            Self::Polygon => 137,
            Self::Avalanche => 43114,
            Self::Moonriver => 1285,
            Self::Harmony => 1_666_600_000,
        }
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.backend_name())
    }
}

/// Network mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetMode {
    Mainnet,
    Testnet,
}

impl NetMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for NetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A token on one chain. Amount bounds are in token units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub blockchain: Blockchain,
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
}

/// One logical asset across the two chains of a bridge route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub symbol: String,
    pub from_chain: Blockchain,
    pub to_chain: Blockchain,
    pub tokens: BTreeMap<Blockchain, Token>,
    pub swap_contracts: BTreeMap<Blockchain, Address>,
    /// Fee reported for the route's source chain
    pub from_fee: Option<Decimal>,
    /// Fee reported for the route's destination chain
    pub to_fee: Option<Decimal>,
}

/// Per-chain half of a [`TokenPair`]
#[derive(Debug, Clone)]
pub struct PairSide {
    pub token: Token,
    pub swap_contract: Address,
    pub fee: Option<Decimal>,
}

impl TokenPair {
    /// Build a pair; the two sides must be on different chains.
    pub fn new(symbol: impl Into<String>, from: PairSide, to: PairSide) -> Result<Self, ProtocolError> {
        let from_chain = from.token.blockchain;
        let to_chain = to.token.blockchain;
        if from_chain == to_chain {
            return Err(ProtocolError::UnsupportedRoute {
                from: from_chain,
                to: to_chain,
            });
        }

        let mut tokens = BTreeMap::new();
        tokens.insert(from_chain, from.token);
        tokens.insert(to_chain, to.token);

        let mut swap_contracts = BTreeMap::new();
        swap_contracts.insert(from_chain, from.swap_contract);
        swap_contracts.insert(to_chain, to.swap_contract);

        Ok(Self {
            symbol: symbol.into(),
            from_chain,
            to_chain,
            tokens,
            swap_contracts,
            from_fee: from.fee,
            to_fee: to.fee,
        })
    }

    pub fn token(&self, chain: Blockchain) -> Option<&Token> {
        self.tokens.get(&chain)
    }

    pub fn swap_contract(&self, chain: Blockchain) -> Option<Address> {
        self.swap_contracts.get(&chain).copied()
    }

    /// Whether `from -> to` is one of the two directions of this pair
    pub fn serves(&self, from: Blockchain, to: Blockchain) -> bool {
        from != to && self.tokens.contains_key(&from) && self.tokens.contains_key(&to)
    }
}

/// Called with a transaction hash as soon as the wallet reports it
pub type OnTransactionHash = Arc<dyn Fn(TxHash) + Send + Sync>;

/// A cross-chain transfer requested by the user. `amount` is in token units.
#[derive(Clone)]
pub struct TransferRequest {
    pub from_chain: Blockchain,
    pub to_chain: Blockchain,
    pub pair: TokenPair,
    pub amount: Decimal,
    pub to_address: String,
    pub on_transaction_hash: Option<OnTransactionHash>,
}

impl TransferRequest {
    /// Token on the source chain
    pub fn source_token(&self) -> Option<&Token> {
        self.pair.token(self.from_chain)
    }
}

impl fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("from_chain", &self.from_chain)
            .field("to_chain", &self.to_chain)
            .field("symbol", &self.pair.symbol)
            .field("amount", &self.amount)
            .field("to_address", &self.to_address)
            .field("has_callback", &self.on_transaction_hash.is_some())
            .finish()
    }
}

/// On-chain permission for `spender` to move `owner`'s tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allowance {
    pub owner: Address,
    pub spender: Address,
    pub token: Address,
    pub amount: alloy_primitives::U256,
}

/// The connected wallet, passed explicitly into every orchestration call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletContext {
    pub address: Address,
}

impl WalletContext {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

/// Token selected for staking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeToken {
    pub blockchain: Blockchain,
    pub address: Address,
    pub decimals: u8,
}

/// Wallet plus the token selected at the moment the user acted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeContext {
    pub wallet: WalletContext,
    pub token: StakeToken,
}

/// Mined transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub status: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn token(chain: Blockchain) -> Token {
        Token {
            blockchain: chain,
            address: Address::repeat_byte(0x11),
            symbol: "RBC".to_string(),
            name: "Rubic".to_string(),
            decimals: 18,
            min_amount: Decimal::from(100),
            max_amount: Decimal::from(100_000),
        }
    }

    fn side(chain: Blockchain) -> PairSide {
        PairSide {
            token: token(chain),
            swap_contract: Address::repeat_byte(0x22),
            fee: Some(Decimal::from_str("1.5").unwrap()),
        }
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(Blockchain::BinanceSmartChain.backend_name(), "binance-smart-chain");
        assert_eq!(
            Blockchain::from_backend_name("Ethereum"),
            Some(Blockchain::Ethereum)
        );
        assert_eq!(
            Blockchain::from_backend_name("MATIC"),
            Some(Blockchain::Polygon)
        );
        assert!(Blockchain::Polygon.matches_backend_name("polygon"));
        assert_eq!(Blockchain::from_backend_name("solana"), None);
    }

    #[test]
    fn test_serde_uses_backend_names() {
        let json = serde_json::to_string(&Blockchain::BinanceSmartChain).unwrap();
        assert_eq!(json, "\"binance-smart-chain\"");
        for chain in Blockchain::ALL {
            let json = serde_json::to_string(&chain).unwrap();
            assert_eq!(json, format!("\"{}\"", chain.backend_name()));
        }
    }

    #[test]
    fn test_pair_requires_two_chains() {
        let pair = TokenPair::new(
            "RBC",
            side(Blockchain::Ethereum),
            side(Blockchain::BinanceSmartChain),
        )
        .unwrap();
        assert_eq!(pair.tokens.len(), 2);
        assert!(pair.serves(Blockchain::Ethereum, Blockchain::BinanceSmartChain));
        assert!(pair.serves(Blockchain::BinanceSmartChain, Blockchain::Ethereum));
        assert!(!pair.serves(Blockchain::Polygon, Blockchain::Ethereum));

        let err = TokenPair::new("RBC", side(Blockchain::Polygon), side(Blockchain::Polygon));
        assert!(matches!(err, Err(ProtocolError::UnsupportedRoute { .. })));
    }
}
