//! In-memory backend
//!
//! Holds the figures the HTTP backend would serve and records every write.
//! Calls are logged to a [`Journal`] as `ledger:<operation>`.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use swap_core::{Blockchain, Journal, LedgerError};

use crate::{
    AuthBackend, BridgeBotNotice, BridgeNetworkInfo, BridgeTransactionRecord, BridgeTxHashNotice,
    DepositRecord, LedgerBackend, Result, SignedNonce, UserProfile,
};

#[derive(Default)]
struct LedgerState {
    networks: Vec<BridgeNetworkInfo>,
    networks_delay: Option<Duration>,
    apr: Decimal,
    refill_time: String,
    deposits: HashMap<Address, U256>,
    bridge_contract_address: String,
    token_prices: HashMap<(Blockchain, Address), Decimal>,
    failing: HashSet<String>,

    bridge_transactions: Vec<BridgeTransactionRecord>,
    bot_notices: Vec<BridgeBotNotice>,
    deposit_updates: Vec<DepositRecord>,
    withdraw_updates: Vec<DepositRecord>,
    bridge_tx_hashes: Vec<BridgeTxHashNotice>,

    nonce: String,
    signed_nonces: Vec<SignedNonce>,
    session: Option<Address>,
    logouts: usize,
}

#[derive(Default)]
pub struct InMemoryLedger {
    journal: Journal,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and fail it when `operation` was marked failing
    fn enter(&self, operation: &str) -> Result<()> {
        self.journal.record(format!("ledger:{}", operation));
        if self.state().failing.contains(operation) {
            return Err(LedgerError::Status {
                endpoint: operation.to_string(),
                status: 503,
            });
        }
        Ok(())
    }

    /// Make `operation` (a trait method name) fail with HTTP 503
    pub fn fail(&self, operation: &str) {
        self.state().failing.insert(operation.to_string());
    }

    pub fn set_networks(&self, networks: Vec<BridgeNetworkInfo>) {
        self.state().networks = networks;
    }

    /// Delay the networks response, e.g. past a caller's timeout
    pub fn delay_networks(&self, delay: Duration) {
        self.state().networks_delay = Some(delay);
    }

    pub fn set_apr(&self, apr: Decimal) {
        self.state().apr = apr;
    }

    pub fn set_refill_time(&self, refill_time: impl Into<String>) {
        self.state().refill_time = refill_time.into();
    }

    pub fn set_deposit(&self, wallet: Address, amount: U256) {
        self.state().deposits.insert(wallet, amount);
    }

    pub fn set_bridge_contract_address(&self, address: impl Into<String>) {
        self.state().bridge_contract_address = address.into();
    }

    pub fn set_token_price(&self, chain: Blockchain, token: Address, price: Decimal) {
        self.state().token_prices.insert((chain, token), price);
    }

    pub fn set_nonce(&self, nonce: impl Into<String>) {
        self.state().nonce = nonce.into();
    }

    pub fn bridge_transactions(&self) -> Vec<BridgeTransactionRecord> {
        self.state().bridge_transactions.clone()
    }

    pub fn bot_notices(&self) -> Vec<BridgeBotNotice> {
        self.state().bot_notices.clone()
    }

    pub fn deposit_updates(&self) -> Vec<DepositRecord> {
        self.state().deposit_updates.clone()
    }

    pub fn withdraw_updates(&self) -> Vec<DepositRecord> {
        self.state().withdraw_updates.clone()
    }

    pub fn bridge_tx_hashes(&self) -> Vec<BridgeTxHashNotice> {
        self.state().bridge_tx_hashes.clone()
    }

    pub fn signed_nonces(&self) -> Vec<SignedNonce> {
        self.state().signed_nonces.clone()
    }

    pub fn logouts(&self) -> usize {
        self.state().logouts
    }
}

#[async_trait]
impl LedgerBackend for InMemoryLedger {
    async fn fetch_bridge_networks(&self) -> Result<Vec<BridgeNetworkInfo>> {
        self.enter("fetch_bridge_networks")?;
        let delay = self.state().networks_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.state().networks.clone())
    }

    async fn post_bridge_transaction(&self, record: &BridgeTransactionRecord) -> Result<()> {
        self.enter("post_bridge_transaction")?;
        self.state().bridge_transactions.push(record.clone());
        Ok(())
    }

    async fn notify_bridge_bot(&self, notice: &BridgeBotNotice) -> Result<()> {
        self.enter("notify_bridge_bot")?;
        self.state().bot_notices.push(notice.clone());
        Ok(())
    }

    async fn fetch_apr(&self) -> Result<Decimal> {
        self.enter("fetch_apr")?;
        Ok(self.state().apr)
    }

    async fn fetch_refill_time(&self) -> Result<String> {
        self.enter("fetch_refill_time")?;
        Ok(self.state().refill_time.clone())
    }

    async fn fetch_users_deposit(&self, wallet: Address) -> Result<U256> {
        self.enter("fetch_users_deposit")?;
        Ok(self.state().deposits.get(&wallet).copied().unwrap_or_default())
    }

    async fn update_users_deposit(&self, record: &DepositRecord) -> Result<()> {
        self.enter("update_users_deposit")?;
        let mut state = self.state();
        let deposit = state.deposits.entry(record.wallet_address).or_default();
        *deposit = deposit.saturating_add(record.amount_units());
        state.deposit_updates.push(record.clone());
        Ok(())
    }

    async fn update_users_deposit_after_withdraw(&self, record: &DepositRecord) -> Result<()> {
        self.enter("update_users_deposit_after_withdraw")?;
        let mut state = self.state();
        let deposit = state.deposits.entry(record.wallet_address).or_default();
        *deposit = deposit.saturating_sub(record.amount_units());
        state.withdraw_updates.push(record.clone());
        Ok(())
    }

    async fn fetch_bridge_contract_address(&self) -> Result<String> {
        self.enter("fetch_bridge_contract_address")?;
        Ok(self.state().bridge_contract_address.clone())
    }

    async fn send_bridge_tx_hash(&self, notice: &BridgeTxHashNotice) -> Result<()> {
        self.enter("send_bridge_tx_hash")?;
        self.state().bridge_tx_hashes.push(notice.clone());
        Ok(())
    }

    async fn fetch_token_price(&self, chain: Blockchain, token: Address) -> Result<Decimal> {
        self.enter("fetch_token_price")?;
        self.state()
            .token_prices
            .get(&(chain, token))
            .copied()
            .ok_or_else(|| LedgerError::Status {
                endpoint: "fetch_token_price".to_string(),
                status: 404,
            })
    }
}

#[async_trait]
impl AuthBackend for InMemoryLedger {
    async fn fetch_auth_nonce(&self) -> Result<String> {
        self.enter("fetch_auth_nonce")?;
        Ok(self.state().nonce.clone())
    }

    async fn send_signed_nonce(&self, signed: &SignedNonce) -> Result<()> {
        self.enter("send_signed_nonce")?;
        let mut state = self.state();
        state.session = Some(signed.address);
        state.signed_nonces.push(signed.clone());
        Ok(())
    }

    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.enter("fetch_profile")?;
        self.state()
            .session
            .map(|address| UserProfile {
                username: address.to_string(),
            })
            .ok_or_else(|| LedgerError::Status {
                endpoint: "fetch_profile".to_string(),
                status: 401,
            })
    }

    async fn logout(&self) -> Result<()> {
        self.enter("logout")?;
        let mut state = self.state();
        state.session = None;
        state.logouts += 1;
        Ok(())
    }
}
