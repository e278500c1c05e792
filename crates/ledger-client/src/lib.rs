//! ledger-client: Access to the off-chain backend
//!
//! The backend keeps the bridge network list, staking deposit bookkeeping,
//! APR and price figures, and wallet sign-in sessions. Orchestrators use it
//! through [`LedgerBackend`]; the session service through [`AuthBackend`].

pub mod dto;
pub mod http;
pub mod memory;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use swap_core::{Blockchain, LedgerError};

pub use dto::{
    BridgeBotNotice, BridgeNetworkInfo, BridgeTransactionRecord, BridgeTxHashNotice,
    DepositRecord, SignedNonce, UserProfile,
};
pub use http::HttpLedgerClient;
pub use memory::InMemoryLedger;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Per-chain bridge figures: minimum amount, fee, contract addresses
    async fn fetch_bridge_networks(&self) -> Result<Vec<BridgeNetworkInfo>>;

    /// Record a transfer as soon as its source-chain hash is known
    async fn post_bridge_transaction(&self, record: &BridgeTransactionRecord) -> Result<()>;

    async fn notify_bridge_bot(&self, notice: &BridgeBotNotice) -> Result<()>;

    async fn fetch_apr(&self) -> Result<Decimal>;

    async fn fetch_refill_time(&self) -> Result<String>;

    /// Total deposited by `wallet`, in smallest units
    async fn fetch_users_deposit(&self, wallet: Address) -> Result<U256>;

    async fn update_users_deposit(&self, record: &DepositRecord) -> Result<()>;

    async fn update_users_deposit_after_withdraw(&self, record: &DepositRecord) -> Result<()>;

    /// Destination address for stake-via-bridge transfers
    async fn fetch_bridge_contract_address(&self) -> Result<String>;

    async fn send_bridge_tx_hash(&self, notice: &BridgeTxHashNotice) -> Result<()>;

    /// USD price of one token unit
    async fn fetch_token_price(&self, chain: Blockchain, token: Address) -> Result<Decimal>;
}

/// Wallet sign-in against the backend
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Challenge message the wallet must sign
    async fn fetch_auth_nonce(&self) -> Result<String>;

    async fn send_signed_nonce(&self, signed: &SignedNonce) -> Result<()>;

    async fn fetch_profile(&self) -> Result<UserProfile>;

    async fn logout(&self) -> Result<()>;
}
