//! Configuration types

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use alloy_primitives::{address, Address};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Blockchain, Error, NetMode};

/// Backend endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Main backend (staking, deposits, auth, prices)
    pub api_url: String,

    /// Bridge backend (networks, bridge transactions)
    pub bridge_api_url: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.rubic.exchange/api/".to_string(),
            bridge_api_url: "https://bridge-api.rubic.exchange/api/v1/".to_string(),
        }
    }
}

/// JSON-RPC endpoint for one chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRpcConfig {
    pub blockchain: Blockchain,
    pub rpc_url: String,
}

/// Configured half of a bridge route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSideConfig {
    pub blockchain: Blockchain,
    pub token_address: Address,
    /// Falls back to the address reported by the networks endpoint when unset
    #[serde(default)]
    pub swap_contract: Option<Address>,
    pub symbol: String,
    pub name: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    pub max_amount: Decimal,
}

fn default_decimals() -> u8 {
    crate::DEFAULT_DECIMALS
}

/// A two-chain bridge route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRouteConfig {
    pub from: BridgeSideConfig,
    pub to: BridgeSideConfig,
}

/// Bridge routes served by the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub routes: Vec<BridgeRouteConfig>,
}

const BRBC_BSC: Address = address!("8E3BCC334657560253B83f08331d85267316e08a");
const RBC_ETHEREUM: Address = address!("A4EED63db85311E22dF4473f87CcfC3DaDCFA3E3");
const RBC_POLYGON: Address = address!("c3cFFDAf8F3fdF07da6D5e3A89B8723D5E385ff8");

fn brbc_side() -> BridgeSideConfig {
    BridgeSideConfig {
        blockchain: Blockchain::BinanceSmartChain,
        token_address: BRBC_BSC,
        swap_contract: None,
        symbol: "BRBC".to_string(),
        name: "BRBC".to_string(),
        decimals: 18,
        max_amount: Decimal::from(100_000),
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            routes: vec![
                BridgeRouteConfig {
                    from: BridgeSideConfig {
                        blockchain: Blockchain::Ethereum,
                        token_address: RBC_ETHEREUM,
                        swap_contract: None,
                        symbol: "RBC".to_string(),
                        name: "Rubic".to_string(),
                        decimals: 18,
                        max_amount: Decimal::from(100_100),
                    },
                    to: brbc_side(),
                },
                BridgeRouteConfig {
                    from: BridgeSideConfig {
                        blockchain: Blockchain::Polygon,
                        token_address: RBC_POLYGON,
                        swap_contract: None,
                        symbol: "RBC".to_string(),
                        name: "Rubic (pos)".to_string(),
                        decimals: 18,
                        max_amount: Decimal::from(100_100),
                    },
                    to: brbc_side(),
                },
            ],
        }
    }
}

/// Staking contract settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Staking contract; also the receipt-token (xBRBC) contract
    pub staking_contract: Address,

    /// Token staked on the native chain
    #[serde(default = "default_stake_token")]
    pub stake_token: Address,

    /// Chain the staking contract lives on
    #[serde(default = "default_native_chain")]
    pub native_chain: Blockchain,

    /// Network label sent with deposit records
    #[serde(default = "default_network_label")]
    pub network_label: String,

    /// Reference token price refresh period in milliseconds
    #[serde(default = "default_price_refresh_ms")]
    pub price_refresh_ms: u64,
}

fn default_stake_token() -> Address {
    BRBC_BSC
}

fn default_native_chain() -> Blockchain {
    Blockchain::BinanceSmartChain
}

fn default_network_label() -> String {
    Blockchain::BinanceSmartChain.backend_name().to_string()
}

fn default_price_refresh_ms() -> u64 {
    600_000
}

impl StakingConfig {
    pub fn new(staking_contract: Address) -> Self {
        Self {
            staking_contract,
            stake_token: default_stake_token(),
            native_chain: default_native_chain(),
            network_label: default_network_label(),
            price_refresh_ms: default_price_refresh_ms(),
        }
    }

    /// Price refresh period, never shorter than 1 ms
    pub fn price_refresh_period(&self) -> Duration {
        Duration::from_millis(self.price_refresh_ms.max(1))
    }

    /// Whether a stake token on `chain` is staked directly rather than
    /// bridged. On testnet both BSC networks count as native.
    pub fn is_native_chain(&self, chain: Blockchain, net_mode: NetMode) -> bool {
        let is_bsc = |c: Blockchain| {
            matches!(
                c,
                Blockchain::BinanceSmartChain | Blockchain::BinanceSmartChainTestnet
            )
        };
        chain == self.native_chain
            || (net_mode == NetMode::Testnet && is_bsc(chain) && is_bsc(self.native_chain))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.price_refresh_ms == 0 {
            return Err(Error::Config(
                "staking.price_refresh_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Mainnet or testnet contract set
    pub net_mode: NetMode,

    /// API server bind address
    #[serde(default = "default_api_host")]
    pub api_host: IpAddr,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default = "default_chains")]
    pub chains: Vec<ChainRpcConfig>,

    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Staking is disabled when no contract is configured
    #[serde(default)]
    pub staking: Option<StakingConfig>,
}

fn default_api_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_api_port() -> u16 {
    19080
}

fn default_chains() -> Vec<ChainRpcConfig> {
    vec![
        ChainRpcConfig {
            blockchain: Blockchain::Ethereum,
            rpc_url: "https://cloudflare-eth.com".to_string(),
        },
        ChainRpcConfig {
            blockchain: Blockchain::BinanceSmartChain,
            rpc_url: "https://bsc-dataseed.binance.org".to_string(),
        },
        ChainRpcConfig {
            blockchain: Blockchain::Polygon,
            rpc_url: "https://polygon-rpc.com".to_string(),
        },
    ]
}

impl AppConfig {
    pub fn api_addr(&self) -> SocketAddr {
        SocketAddr::new(self.api_host, self.api_port)
    }

    /// Reject values the services cannot run with
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(staking) = &self.staking {
            staking.validate()?;
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            net_mode: NetMode::Mainnet,
            api_host: default_api_host(),
            api_port: default_api_port(),
            ledger: LedgerConfig::default(),
            chains: default_chains(),
            bridge: BridgeConfig::default(),
            staking: None,
        }
    }
}
