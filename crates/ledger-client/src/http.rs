//! HTTP JSON client for the backend

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use swap_core::{Blockchain, LedgerConfig, LedgerError};

use crate::dto::{
    AprResponse, BridgeContractResponse, DepositResponse, RefillTimeResponse, TokenPriceResponse,
};
use crate::{
    AuthBackend, BridgeBotNotice, BridgeNetworkInfo, BridgeTransactionRecord, BridgeTxHashNotice,
    DepositRecord, LedgerBackend, Result, SignedNonce, UserProfile,
};

/// Default timeout for backend calls (30 seconds).
const LEDGER_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

// Bridge API
const NETWORKS: &str = "networks/";
const TRANSACTIONS: &str = "transactions/";

// Main API
const BRIDGE_BOT: &str = "bot/bridge-swap/";
const STAKING_APR: &str = "staking/apr/";
const STAKING_REFILL_TIME: &str = "staking/refill-time/";
const STAKING_DEPOSIT: &str = "staking/deposit/";
const STAKING_WITHDRAW: &str = "staking/withdraw/";
const STAKING_BRIDGE_CONTRACT: &str = "staking/bridge-contract/";
const STAKING_BRIDGE_TX: &str = "staking/bridge-tx/";
const TOKEN_PRICE: &str = "tokens/price/";
const AUTH_NONCE: &str = "get_metamask_message/";
const AUTH_SIGNED_NONCE: &str = "auth/metamask/";
const AUTH_PROFILE: &str = "auth/profile/";
const AUTH_LOGOUT: &str = "auth/logout/";

#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    client: reqwest::Client,
    api_url: String,
    bridge_api_url: String,
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

impl HttpLedgerClient {
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("swapd")
            .build()
            .map_err(|e| LedgerError::Transport {
                endpoint: config.api_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_url: with_trailing_slash(&config.api_url),
            bridge_api_url: with_trailing_slash(&config.bridge_api_url),
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn bridge_api(&self, path: &str) -> String {
        format!("{}{}", self.bridge_api_url, path)
    }

    async fn send(&self, url: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = tokio::time::timeout(LEDGER_REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| LedgerError::Timeout {
                endpoint: url.to_string(),
            })?
            .map_err(|e| LedgerError::Transport {
                endpoint: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = url, status = status.as_u16(), "Backend request failed");
            return Err(LedgerError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String, query: &[(&str, String)]) -> Result<T> {
        let response = self.send(&url, self.client.get(&url).query(query)).await?;
        response.json::<T>().await.map_err(|e| LedgerError::Decode {
            endpoint: url,
            message: e.to_string(),
        })
    }

    async fn post_json<B: Serialize + Sync>(&self, url: String, body: &B) -> Result<()> {
        self.send(&url, self.client.post(&url).json(body)).await?;
        Ok(())
    }
}

/// Whole smallest units from a backend decimal
fn decimal_to_units(endpoint: &str, value: Decimal) -> Result<U256> {
    if value.is_sign_negative() {
        return Err(LedgerError::Decode {
            endpoint: endpoint.to_string(),
            message: format!("negative amount {}", value),
        });
    }
    U256::from_str(&value.trunc().to_string()).map_err(|e| LedgerError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl LedgerBackend for HttpLedgerClient {
    async fn fetch_bridge_networks(&self) -> Result<Vec<BridgeNetworkInfo>> {
        self.get_json(self.bridge_api(NETWORKS), &[]).await
    }

    async fn post_bridge_transaction(&self, record: &BridgeTransactionRecord) -> Result<()> {
        self.post_json(self.bridge_api(TRANSACTIONS), record).await
    }

    async fn notify_bridge_bot(&self, notice: &BridgeBotNotice) -> Result<()> {
        self.post_json(self.api(BRIDGE_BOT), notice).await
    }

    async fn fetch_apr(&self) -> Result<Decimal> {
        let response: AprResponse = self.get_json(self.api(STAKING_APR), &[]).await?;
        Ok(response.apr)
    }

    async fn fetch_refill_time(&self) -> Result<String> {
        let response: RefillTimeResponse =
            self.get_json(self.api(STAKING_REFILL_TIME), &[]).await?;
        Ok(response.refill_time)
    }

    async fn fetch_users_deposit(&self, wallet: Address) -> Result<U256> {
        let url = self.api(STAKING_DEPOSIT);
        let response: DepositResponse = self
            .get_json(url.clone(), &[("walletAddress", wallet.to_string())])
            .await?;
        decimal_to_units(&url, response.deposit)
    }

    async fn update_users_deposit(&self, record: &DepositRecord) -> Result<()> {
        self.post_json(self.api(STAKING_DEPOSIT), record).await
    }

    async fn update_users_deposit_after_withdraw(&self, record: &DepositRecord) -> Result<()> {
        self.post_json(self.api(STAKING_WITHDRAW), record).await
    }

    async fn fetch_bridge_contract_address(&self) -> Result<String> {
        let response: BridgeContractResponse =
            self.get_json(self.api(STAKING_BRIDGE_CONTRACT), &[]).await?;
        Ok(response.address)
    }

    async fn send_bridge_tx_hash(&self, notice: &BridgeTxHashNotice) -> Result<()> {
        self.post_json(self.api(STAKING_BRIDGE_TX), notice).await
    }

    async fn fetch_token_price(&self, chain: Blockchain, token: Address) -> Result<Decimal> {
        let response: TokenPriceResponse = self
            .get_json(
                self.api(TOKEN_PRICE),
                &[
                    ("network", chain.backend_name().to_string()),
                    ("address", token.to_string()),
                ],
            )
            .await?;
        Ok(response.usd_price)
    }
}

#[async_trait]
impl AuthBackend for HttpLedgerClient {
    async fn fetch_auth_nonce(&self) -> Result<String> {
        let url = self.api(AUTH_NONCE);
        let response = self.send(&url, self.client.get(&url)).await?;
        let text = response.text().await.map_err(|e| LedgerError::Decode {
            endpoint: url.clone(),
            message: e.to_string(),
        })?;
        // plain text or a JSON string
        Ok(serde_json::from_str::<String>(&text).unwrap_or(text))
    }

    async fn send_signed_nonce(&self, signed: &SignedNonce) -> Result<()> {
        self.post_json(self.api(AUTH_SIGNED_NONCE), signed).await
    }

    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.get_json(self.api(AUTH_PROFILE), &[]).await
    }

    async fn logout(&self) -> Result<()> {
        let url = self.api(AUTH_LOGOUT);
        self.send(&url, self.client.get(&url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve(router: Router) -> LedgerConfig {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        LedgerConfig {
            api_url: format!("http://{}", addr),
            bridge_api_url: format!("http://{}/", addr),
        }
    }

    #[test]
    fn test_trailing_slash() {
        assert_eq!(with_trailing_slash("http://a/api"), "http://a/api/");
        assert_eq!(with_trailing_slash("http://a/api/"), "http://a/api/");
    }

    #[test]
    fn test_decimal_to_units() {
        assert_eq!(
            decimal_to_units("x", Decimal::from_str("1500000000000000000").unwrap()).unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(
            decimal_to_units("x", Decimal::from_str("10.9").unwrap()).unwrap(),
            U256::from(10u64)
        );
        assert!(decimal_to_units("x", Decimal::from(-1)).is_err());
    }

    #[tokio::test]
    async fn test_fetch_networks_and_deposit() {
        let router = Router::new()
            .route(
                "/networks/",
                get(|| async {
                    Json(json!([
                        {"min_amount": "200", "token_address": "0x1", "swap_address": "0x2",
                         "fee": "60", "network": "ethereum"}
                    ]))
                }),
            )
            .route(
                "/staking/deposit/",
                get(|| async { Json(json!({"deposit": "2500000000000000000"})) })
                    .post(|| async { StatusCode::CREATED }),
            );
        let client = HttpLedgerClient::new(&serve(router).await).unwrap();

        let networks = client.fetch_bridge_networks().await.unwrap();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].network, "ethereum");

        let deposit = client.fetch_users_deposit(Address::ZERO).await.unwrap();
        assert_eq!(deposit, U256::from(2_500_000_000_000_000_000u128));

        let record = DepositRecord::new(Address::ZERO, U256::from(1u64), "0x01", "binance-smart-chain");
        client.update_users_deposit(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_and_decode() {
        let router = Router::new()
            .route("/staking/apr/", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/auth/profile/", get(|| async { "not json" }))
            .route("/get_metamask_message/", get(|| async { Json(json!("sign me")) }))
            .route("/staking/bridge-tx/", post(|| async { StatusCode::OK }));
        let client = HttpLedgerClient::new(&serve(router).await).unwrap();

        assert!(matches!(
            client.fetch_apr().await,
            Err(LedgerError::Status { status: 500, .. })
        ));
        assert!(matches!(
            client.fetch_profile().await,
            Err(LedgerError::Decode { .. })
        ));
        assert_eq!(client.fetch_auth_nonce().await.unwrap(), "sign me");
        assert!(matches!(
            client.fetch_refill_time().await,
            Err(LedgerError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let client = HttpLedgerClient::new(&LedgerConfig {
            api_url: "http://127.0.0.1:1/".to_string(),
            bridge_api_url: "http://127.0.0.1:1/".to_string(),
        })
        .unwrap();
        assert!(matches!(
            client.fetch_bridge_networks().await,
            Err(LedgerError::Transport { .. })
        ));
    }
}
