//! Provider configuration
//!
//! Every supported DEX is a Uniswap V2 fork. Differences between them are
//! data: router address, routing tokens, gas limit and the swap fee Solarbeam
//! expects on `getAmountsOut`.

use std::fmt;

use alloy_primitives::{address, Address, U256};
use serde::{Deserialize, Serialize};
use swap_core::Blockchain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Solarbeam,
    ViperSwap,
    TraderJoe,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solarbeam => "solarbeam",
            Self::ViperSwap => "viper-swap",
            Self::TraderJoe => "trader-joe",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const DEFAULT_GAS_LIMIT: u64 = 250_000;

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub blockchain: Blockchain,
    pub router: Address,

    /// Intermediate tokens tried as a single hop
    #[serde(default)]
    pub routing_tokens: Vec<Address>,

    /// Fee passed as the trailing `getAmountsOut` argument, for routers
    /// that take one
    #[serde(default)]
    pub amounts_out_fee: Option<U256>,

    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

/// Solarbeam's swap fee in basis points, passed to `getAmountsOut`
pub const SOLARBEAM_FEE: u64 = 25;

impl ProviderConfig {
    pub fn solarbeam() -> Self {
        Self {
            provider: ProviderKind::Solarbeam,
            blockchain: Blockchain::Moonriver,
            router: address!("AA30eF758139ae4a7f798112902Bf6d65612045f"),
            routing_tokens: vec![
                // WMOVR
                address!("98878B06940aE243284CA214f92Bb71a2b032B8A"),
                // USDC
                address!("E3F5a90F9cb311505cd691a46596599aA1A0AD7D"),
            ],
            amounts_out_fee: Some(U256::from(SOLARBEAM_FEE)),
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }

    pub fn viper_swap() -> Self {
        Self {
            provider: ProviderKind::ViperSwap,
            blockchain: Blockchain::Harmony,
            router: address!("f012702a5f0e54015362cBCA26a26fc90AA832a3"),
            routing_tokens: vec![
                // WONE
                address!("cF664087a5bB0237a0BAd6742852ec6c8d69A27a"),
            ],
            amounts_out_fee: None,
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }

    pub fn trader_joe() -> Self {
        Self {
            provider: ProviderKind::TraderJoe,
            blockchain: Blockchain::Avalanche,
            router: address!("60aE616a2155Ee3d9A68541Ba4544862310933d4"),
            routing_tokens: vec![
                // WAVAX
                address!("B31f66AA3C1e785363F0875A1B74E27b85FD66c7"),
                // USDT.e
                address!("c7198437980c041c805A1EDcbA50c1Ce5db95118"),
            ],
            amounts_out_fee: None,
            gas_limit: 320_000,
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![Self::solarbeam(), Self::viper_swap(), Self::trader_joe()]
    }
}
