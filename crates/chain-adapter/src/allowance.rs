//! Allowance checks and approvals
//!
//! Approvals are always for [`INFINITE_ALLOWANCE`]. The manager serializes
//! check-then-approve per (chain, token, owner, spender), so two concurrent
//! callers never both submit an approval for the same key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, U256};
use swap_core::{Blockchain, OnTransactionHash, TxReceipt, INFINITE_ALLOWANCE};

use crate::{ChainReadAdapter, ChainWriteAdapter, Result};

/// What must be spendable, in smallest units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceRequest {
    pub chain: Blockchain,
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub required: U256,
}

type AllowanceKey = (Blockchain, Address, Address, Address);

impl AllowanceRequest {
    fn key(&self) -> AllowanceKey {
        (self.chain, self.token, self.owner, self.spender)
    }
}

/// `true` when the current allowance does not cover `required`
pub async fn needs_approval(
    read: &dyn ChainReadAdapter,
    request: &AllowanceRequest,
) -> Result<bool> {
    let allowance = read
        .get_allowance(request.token, request.owner, request.spender)
        .await?;
    Ok(allowance < request.required)
}

type KeyLocks = Mutex<HashMap<AllowanceKey, Arc<tokio::sync::Mutex<()>>>>;

/// A caller's handle on one key's lock. Dropping the last handle removes the
/// key from the map.
struct KeyLock<'a> {
    locks: &'a KeyLocks,
    key: AllowanceKey,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // the map and this handle
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}

#[derive(Debug, Default)]
pub struct AllowanceManager {
    locks: KeyLocks,
}

impl AllowanceManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: AllowanceKey) -> KeyLock<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let lock = locks.entry(key).or_default().clone();
        KeyLock {
            locks: &self.locks,
            key,
            lock,
        }
    }

    /// Keys with an approval check in flight
    pub fn pending_keys(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Approve `spender` for an unlimited amount unless the current allowance
    /// already covers the request. Returns the approval receipt, or `None`
    /// when no approval was needed.
    pub async fn ensure_allowance(
        &self,
        read: &dyn ChainReadAdapter,
        write: &dyn ChainWriteAdapter,
        request: &AllowanceRequest,
    ) -> Result<Option<TxReceipt>> {
        let key_lock = self.lock_for(request.key());
        let _guard = key_lock.lock.lock().await;

        if !needs_approval(read, request).await? {
            tracing::debug!(
                chain = %request.chain,
                token = %request.token,
                spender = %request.spender,
                "Allowance sufficient"
            );
            return Ok(None);
        }

        tracing::info!(
            chain = %request.chain,
            token = %request.token,
            spender = %request.spender,
            required = %request.required,
            "Approving unlimited allowance"
        );
        let receipt = write
            .approve_tokens(request.token, request.spender, INFINITE_ALLOWANCE)
            .await?;
        Ok(Some(receipt))
    }

    /// Approve unconditionally, handing the approval hash to `on_hash` once
    /// the wallet reports it
    pub async fn approve(
        &self,
        write: &dyn ChainWriteAdapter,
        request: &AllowanceRequest,
        on_hash: Option<OnTransactionHash>,
    ) -> Result<TxReceipt> {
        let key_lock = self.lock_for(request.key());
        let _guard = key_lock.lock.lock().await;
        let tx_hash = write
            .send_approve(request.token, request.spender, INFINITE_ALLOWANCE)
            .await?;
        if let Some(on_hash) = on_hash {
            on_hash(tx_hash);
        }
        write.confirm(tx_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryChain;
    use alloy_primitives::address;

    const TOKEN: Address = address!("1010101010101010101010101010101010101010");
    const OWNER: Address = address!("2020202020202020202020202020202020202020");
    const SPENDER: Address = address!("3030303030303030303030303030303030303030");

    fn request(required: u64) -> AllowanceRequest {
        AllowanceRequest {
            chain: Blockchain::Ethereum,
            token: TOKEN,
            owner: OWNER,
            spender: SPENDER,
            required: U256::from(required),
        }
    }

    #[tokio::test]
    async fn test_sufficient_allowance_skips_approval() {
        let chain = InMemoryChain::new(Blockchain::Ethereum).with_account(OWNER);
        chain.set_allowance(TOKEN, OWNER, SPENDER, U256::from(100u64));

        let manager = AllowanceManager::new();
        let receipt = manager
            .ensure_allowance(&chain, &chain, &request(100))
            .await
            .unwrap();
        assert!(receipt.is_none());
        assert!(chain.sent("approve").is_empty());
        assert_eq!(manager.pending_keys(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_allowance_approves_infinite() {
        let chain = InMemoryChain::new(Blockchain::Ethereum).with_account(OWNER);
        chain.set_allowance(TOKEN, OWNER, SPENDER, U256::from(99u64));

        let manager = AllowanceManager::new();
        let receipt = manager
            .ensure_allowance(&chain, &chain, &request(100))
            .await
            .unwrap();
        assert!(receipt.is_some());
        assert_eq!(
            chain.get_allowance(TOKEN, OWNER, SPENDER).await.unwrap(),
            INFINITE_ALLOWANCE
        );
    }

    #[tokio::test]
    async fn test_concurrent_requests_approve_once() {
        let chain = InMemoryChain::new(Blockchain::Ethereum).with_account(OWNER);
        let manager = AllowanceManager::new();
        let req = request(50);

        let (a, b) = tokio::join!(
            manager.ensure_allowance(&chain, &chain, &req),
            manager.ensure_allowance(&chain, &chain, &req),
        );
        let approvals = [a.unwrap(), b.unwrap()]
            .iter()
            .filter(|r| r.is_some())
            .count();
        assert_eq!(approvals, 1);
        assert_eq!(chain.sent("approve").len(), 1);
        assert_eq!(manager.pending_keys(), 0);
    }

    #[tokio::test]
    async fn test_lock_released_after_each_key() {
        let chain = InMemoryChain::new(Blockchain::Ethereum).with_account(OWNER);
        let manager = AllowanceManager::new();
        for spender in 1..=4u8 {
            let req = AllowanceRequest {
                spender: Address::repeat_byte(spender),
                ..request(1)
            };
            manager.approve(&chain, &req, None).await.unwrap();
        }
        assert_eq!(chain.sent("approve").len(), 4);
        assert_eq!(manager.pending_keys(), 0);

        // a waiter keeps the key alive until it is done
        let held = manager.lock_for(request(1).key());
        let guard = held.lock.lock().await;
        assert_eq!(manager.pending_keys(), 1);
        let waiter = manager.lock_for(request(1).key());
        drop(guard);
        drop(held);
        assert_eq!(manager.pending_keys(), 1);
        drop(waiter);
        assert_eq!(manager.pending_keys(), 0);
    }

    #[tokio::test]
    async fn test_read_failure_propagates() {
        let chain = InMemoryChain::new(Blockchain::Ethereum);
        chain.fail_reads("allowance");
        let manager = AllowanceManager::new();
        assert!(manager
            .ensure_allowance(&chain, &chain, &request(1))
            .await
            .is_err());
        assert!(chain.sent_transactions().is_empty());
        assert_eq!(manager.pending_keys(), 0);
    }
}
