//! In-memory chain and wallet
//!
//! Deterministic stand-ins for the collaborator traits. Every read, send and
//! confirmation is recorded in a shared [`Journal`] so callers can assert on
//! ordering.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use alloy_primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use swap_core::{Blockchain, ChainError, Journal, TxReceipt};
use tokio::sync::watch;

use crate::{
    ChainReadAdapter, ChainWriteAdapter, ContractCall, MulticallResult, Result, WalletAdapter,
    IERC20,
};

/// A transaction accepted by [`InMemoryChain`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: TxHash,
    pub contract: Address,
    pub call: ContractCall,
}

#[derive(Default)]
struct ChainState {
    /// (token, owner, spender)
    allowances: HashMap<(Address, Address, Address), U256>,
    /// (token, owner)
    balances: HashMap<(Address, Address), U256>,
    /// Encoded responses keyed by method name
    views: HashMap<String, Bytes>,
    /// Encoded responses keyed by exact calldata; checked before `views`
    call_responses: HashMap<Bytes, Bytes>,
    failing_reads: HashSet<String>,
    rejected_sends: HashSet<String>,
    reverting: HashSet<String>,
    sent: Vec<SentTransaction>,
    nonce: u64,
    block: u64,
}

pub struct InMemoryChain {
    blockchain: Blockchain,
    account: Address,
    journal: Journal,
    state: Mutex<ChainState>,
}

impl InMemoryChain {
    pub fn new(blockchain: Blockchain) -> Self {
        Self {
            blockchain,
            account: Address::ZERO,
            journal: Journal::new(),
            state: Mutex::new(ChainState::default()),
        }
    }

    /// Account that signs transactions sent through this chain
    pub fn with_account(mut self, account: Address) -> Self {
        self.account = account;
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state()
            .allowances
            .insert((token, owner, spender), amount);
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state().balances.insert((token, owner), amount);
    }

    /// Answer every call to `method` with `value`
    pub fn set_view<V: SolValue>(&self, method: &str, value: V) {
        self.state()
            .views
            .insert(method.to_string(), value.abi_encode().into());
    }

    /// Answer this exact call with `value`
    pub fn set_call_response<V: SolValue>(&self, call: &ContractCall, value: V) {
        self.state()
            .call_responses
            .insert(call.calldata().clone(), value.abi_encode().into());
    }

    /// Reads of `method` fail with a node error
    pub fn fail_reads(&self, method: &str) {
        self.state().failing_reads.insert(method.to_string());
    }

    /// The wallet rejects transactions calling `method`
    pub fn reject_sends(&self, method: &str) {
        self.state().rejected_sends.insert(method.to_string());
    }

    /// Transactions calling `method` revert
    pub fn revert(&self, method: &str) {
        self.state().reverting.insert(method.to_string());
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.state().sent.clone()
    }

    pub fn sent(&self, method: &str) -> Vec<SentTransaction> {
        self.state()
            .sent
            .iter()
            .filter(|tx| tx.call.method() == method)
            .cloned()
            .collect()
    }

    fn read(&self, contract: Address, call: &ContractCall) -> Result<Bytes> {
        let method = call.method();
        let state = self.state();
        if state.failing_reads.contains(method) {
            return Err(ChainError::Rpc {
                message: format!("{} unavailable", method),
            });
        }

        if call.is::<IERC20::allowanceCall>() {
            let IERC20::allowanceCall { owner, spender } =
                call.decode::<IERC20::allowanceCall>()?;
            let amount = state
                .allowances
                .get(&(contract, owner, spender))
                .copied()
                .unwrap_or_default();
            return Ok(amount.abi_encode().into());
        }
        if call.is::<IERC20::balanceOfCall>() {
            let IERC20::balanceOfCall { owner } = call.decode::<IERC20::balanceOfCall>()?;
            let balance = state
                .balances
                .get(&(contract, owner))
                .copied()
                .unwrap_or_default();
            return Ok(balance.abi_encode().into());
        }

        state
            .call_responses
            .get(call.calldata())
            .or_else(|| state.views.get(method))
            .cloned()
            .ok_or_else(|| ChainError::Reverted {
                method: method.to_string(),
                reason: "no response configured".to_string(),
            })
    }
}

#[async_trait]
impl ChainReadAdapter for InMemoryChain {
    fn blockchain(&self) -> Blockchain {
        self.blockchain
    }

    async fn call_contract_method(&self, contract: Address, call: &ContractCall) -> Result<Bytes> {
        self.journal.record(format!("read:{}", call.method()));
        self.read(contract, call)
    }

    async fn multicall_contract_methods(
        &self,
        contract: Address,
        calls: &[ContractCall],
    ) -> Result<Vec<MulticallResult>> {
        self.journal.record("read:multicall");
        Ok(calls
            .iter()
            .map(|call| match self.read(contract, call) {
                Ok(return_data) => MulticallResult {
                    success: true,
                    return_data,
                },
                Err(_) => MulticallResult {
                    success: false,
                    return_data: Bytes::new(),
                },
            })
            .collect())
    }
}

#[async_trait]
impl ChainWriteAdapter for InMemoryChain {
    fn blockchain(&self) -> Blockchain {
        self.blockchain
    }

    async fn send_contract_method(&self, contract: Address, call: &ContractCall) -> Result<TxHash> {
        let hash = {
            let mut state = self.state();
            if state.rejected_sends.contains(call.method()) {
                return Err(ChainError::UserRejected);
            }
            state.nonce += 1;
            let hash = keccak256(state.nonce.to_be_bytes());
            state.sent.push(SentTransaction {
                hash,
                contract,
                call: call.clone(),
            });
            hash
        };
        self.journal.record(format!("send:{}", call.method()));
        Ok(hash)
    }

    async fn simulate_contract_method(&self, _contract: Address, call: &ContractCall) -> Result<()> {
        self.journal.record(format!("simulate:{}", call.method()));
        if self.state().reverting.contains(call.method()) {
            return Err(ChainError::Reverted {
                method: call.method().to_string(),
                reason: "execution reverted".to_string(),
            });
        }
        Ok(())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt> {
        // let detached tasks spawned after submission run first
        tokio::task::yield_now().await;

        let (method, receipt) = {
            let mut state = self.state();
            let tx = state
                .sent
                .iter()
                .find(|tx| tx.hash == tx_hash)
                .cloned()
                .ok_or_else(|| ChainError::Rpc {
                    message: format!("unknown transaction {}", tx_hash),
                })?;

            let method = tx.call.method().to_string();
            let status = !state.reverting.contains(&method);
            if status {
                if let Ok(approve) = tx.call.decode::<IERC20::approveCall>() {
                    state
                        .allowances
                        .insert((tx.contract, self.account, approve.spender), approve.amount);
                }
            }

            state.block += 1;
            let receipt = TxReceipt {
                transaction_hash: tx_hash,
                block_number: Some(state.block),
                status,
            };
            (method, receipt)
        };

        self.journal.record(format!("receipt:{}", method));
        Ok(receipt)
    }
}

/// Wallet that connects to a fixed account
pub struct InMemoryWallet {
    account: Address,
    active: AtomicBool,
    reject_signatures: AtomicBool,
    address: watch::Sender<Option<Address>>,
}

impl InMemoryWallet {
    pub fn new(account: Address) -> Self {
        let (address, _) = watch::channel(None);
        Self {
            account,
            active: AtomicBool::new(false),
            reject_signatures: AtomicBool::new(false),
            address,
        }
    }

    pub fn reject_signatures(&self, reject: bool) {
        self.reject_signatures.store(reject, Ordering::SeqCst);
    }

    /// Simulate the user switching accounts in the wallet
    pub fn switch_account(&self, account: Option<Address>) {
        self.address.send_replace(account);
    }
}

#[async_trait]
impl WalletAdapter for InMemoryWallet {
    fn address(&self) -> Option<Address> {
        *self.address.borrow()
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn activate(&self) -> Result<()> {
        self.active.store(true, Ordering::SeqCst);
        self.address.send_replace(Some(self.account));
        Ok(())
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.address.send_replace(None);
    }

    async fn sign_personal(&self, message: &str) -> Result<String> {
        if self.reject_signatures.load(Ordering::SeqCst) {
            return Err(ChainError::UserRejected);
        }
        let address = self.address().ok_or_else(|| ChainError::Rpc {
            message: "wallet is not connected".to_string(),
        })?;
        let digest = keccak256(format!("{}:{}", address, message).as_bytes());
        Ok(format!("0x{}", hex::encode(digest)))
    }

    fn subscribe_address(&self) -> watch::Receiver<Option<Address>> {
        self.address.subscribe()
    }
}
