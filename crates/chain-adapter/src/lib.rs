//! chain-adapter: Capability traits over EVM-style chains
//!
//! Orchestrators never talk to a node or wallet directly. They go through
//! [`ChainReadAdapter`] for view calls and [`ChainWriteAdapter`] for signed
//! transactions, looked up per chain in a [`ChainAdapters`] registry.

pub mod allowance;
pub mod call;
pub mod memory;
pub mod registry;
pub mod rpc;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use swap_core::{ChainError, OnTransactionHash, TxReceipt};
use tokio::sync::watch;

pub use allowance::{needs_approval, AllowanceManager, AllowanceRequest};
pub use call::{decode_returns, ContractCall, MulticallResult, IERC20};
pub use memory::{InMemoryChain, InMemoryWallet, SentTransaction};
pub use registry::ChainAdapters;
pub use rpc::RpcReadAdapter;

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Read-only access to one chain
#[async_trait]
pub trait ChainReadAdapter: Send + Sync {
    fn blockchain(&self) -> swap_core::Blockchain;

    /// Raw return data of a view call; decode it with [`decode_returns`]
    async fn call_contract_method(&self, contract: Address, call: &ContractCall) -> Result<Bytes>;

    /// Run several view calls against one contract. A failing call yields
    /// `success: false` instead of failing the batch.
    async fn multicall_contract_methods(
        &self,
        contract: Address,
        calls: &[ContractCall],
    ) -> Result<Vec<MulticallResult>>;

    async fn get_allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let output = self
            .call_contract_method(token, &call::allowance_call(owner, spender))
            .await?;
        Ok(decode_returns::<IERC20::allowanceCall>(&output)?.amount)
    }

    async fn get_token_balance(&self, owner: Address, token: Address) -> Result<U256> {
        let output = self
            .call_contract_method(token, &call::balance_of_call(owner))
            .await?;
        Ok(decode_returns::<IERC20::balanceOfCall>(&output)?.balance)
    }
}

/// Signed-transaction access to one chain through the connected wallet.
///
/// Submission and confirmation are separate steps: `send_*` returns as soon
/// as the wallet hands back a hash, `wait_for_receipt` resolves once mined.
#[async_trait]
pub trait ChainWriteAdapter: Send + Sync {
    fn blockchain(&self) -> swap_core::Blockchain;

    async fn send_contract_method(&self, contract: Address, call: &ContractCall)
        -> Result<TxHash>;

    /// Dry-run a state-changing call; `Err` when it would revert
    async fn simulate_contract_method(&self, contract: Address, call: &ContractCall)
        -> Result<()>;

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt>;

    async fn send_approve(&self, token: Address, spender: Address, amount: U256) -> Result<TxHash> {
        self.send_contract_method(token, &call::approve_call(spender, amount))
            .await
    }

    /// Wait for a receipt and fail on a reverted status
    async fn confirm(&self, tx_hash: TxHash) -> Result<TxReceipt> {
        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.status {
            return Err(ChainError::TransactionFailed {
                tx_hash: tx_hash.to_string(),
            });
        }
        Ok(receipt)
    }

    async fn approve_tokens(&self, token: Address, spender: Address, amount: U256) -> Result<TxReceipt> {
        let tx_hash = self.send_approve(token, spender, amount).await?;
        tracing::debug!(%token, %spender, %tx_hash, "Approve submitted");
        self.confirm(tx_hash).await
    }

    /// Send, hand the hash to `on_hash`, then wait for the receipt
    async fn execute_contract_method(
        &self,
        contract: Address,
        call: &ContractCall,
        on_hash: Option<OnTransactionHash>,
    ) -> Result<TxReceipt> {
        let tx_hash = self.send_contract_method(contract, call).await?;
        tracing::debug!(%contract, method = call.method(), %tx_hash, "Transaction submitted");
        if let Some(on_hash) = on_hash {
            on_hash(tx_hash);
        }
        self.confirm(tx_hash).await
    }

    /// Like [`Self::execute_contract_method`], simulating first so a call
    /// that would revert never reaches the wallet
    async fn try_execute_contract_method(
        &self,
        contract: Address,
        call: &ContractCall,
        on_hash: Option<OnTransactionHash>,
    ) -> Result<TxReceipt> {
        self.simulate_contract_method(contract, call).await?;
        self.execute_contract_method(contract, call, on_hash).await
    }
}

/// The user's wallet connection
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Connected account, `None` when disconnected
    fn address(&self) -> Option<Address>;

    fn is_active(&self) -> bool;

    async fn activate(&self) -> Result<()>;

    fn deactivate(&self);

    /// Sign an arbitrary message with the connected account
    async fn sign_personal(&self, message: &str) -> Result<String>;

    /// Account changes, including disconnects
    fn subscribe_address(&self) -> watch::Receiver<Option<Address>>;
}
