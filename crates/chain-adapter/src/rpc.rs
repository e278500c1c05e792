//! JSON-RPC read adapter
//!
//! View calls go out as `eth_call` against the configured node. The adapter
//! never signs anything; writes need a wallet-backed [`crate::ChainWriteAdapter`].

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use serde::Deserialize;
use swap_core::{Blockchain, ChainError, ChainRpcConfig};

use crate::{ChainReadAdapter, ContractCall, MulticallResult, Result};

/// Default timeout for node calls (30 seconds).
const RPC_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Bytes>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    message: String,
}

pub struct RpcReadAdapter {
    blockchain: Blockchain,
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcReadAdapter {
    pub fn new(blockchain: Blockchain, url: impl Into<String>) -> Self {
        Self {
            blockchain,
            url: url.into(),
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &ChainRpcConfig) -> Self {
        Self::new(config.blockchain, config.rpc_url.clone())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn eth_call(&self, to: Address, call: &ContractCall) -> Result<Bytes> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_call",
            "params": [
                { "to": to, "data": call.calldata() },
                "latest"
            ],
        });

        let response = timed_request(&self.url, self.client.post(&self.url).json(&body).send())
            .await?;
        if !response.status().is_success() {
            return Err(ChainError::Rpc {
                message: format!("{} returned HTTP {}", self.url, response.status()),
            });
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;

        if let Some(err) = parsed.error {
            if err.message.contains("revert") {
                return Err(ChainError::Reverted {
                    method: call.method().to_string(),
                    reason: err.message,
                });
            }
            return Err(ChainError::Rpc {
                message: format!("{} (code {})", err.message, err.code),
            });
        }

        parsed
            .result
            .ok_or_else(|| ChainError::Decode("eth_call returned no result".to_string()))
    }
}

#[async_trait]
impl ChainReadAdapter for RpcReadAdapter {
    fn blockchain(&self) -> Blockchain {
        self.blockchain
    }

    async fn call_contract_method(&self, contract: Address, call: &ContractCall) -> Result<Bytes> {
        self.eth_call(contract, call).await
    }

    async fn multicall_contract_methods(
        &self,
        contract: Address,
        calls: &[ContractCall],
    ) -> Result<Vec<MulticallResult>> {
        let results =
            futures::future::join_all(calls.iter().map(|c| self.call_contract_method(contract, c)))
                .await;

        Ok(results
            .into_iter()
            .zip(calls)
            .map(|(result, call)| match result {
                Ok(return_data) => MulticallResult {
                    success: true,
                    return_data,
                },
                Err(e) => {
                    tracing::debug!(method = call.method(), error = %e, "Multicall entry failed");
                    MulticallResult {
                        success: false,
                        return_data: Bytes::new(),
                    }
                }
            })
            .collect())
    }
}

/// Apply [`RPC_REQUEST_TIMEOUT`] to a request future
async fn timed_request<T, E: std::fmt::Display>(
    url: &str,
    fut: impl std::future::Future<Output = std::result::Result<T, E>>,
) -> Result<T> {
    tokio::time::timeout(RPC_REQUEST_TIMEOUT, fut)
        .await
        .map_err(|_| ChainError::Rpc {
            message: format!(
                "Node request timed out after {}s",
                RPC_REQUEST_TIMEOUT.as_secs()
            ),
        })?
        .map_err(|e| ChainError::Unreachable {
            url: format!("{}: {}", url, e),
        })
}
