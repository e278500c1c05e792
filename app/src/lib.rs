//! swapd application library
//!
//! Wires the chain adapters, ledger client and orchestrators together and
//! serves them over HTTP.

use std::sync::Arc;

use anyhow::Context;
use bridge::BridgeService;
use chain_adapter::{AllowanceManager, ChainAdapters, RpcReadAdapter};
use instant_trade::{InstantTradeService, ProviderConfig};
use ledger_client::HttpLedgerClient;
use staking::StakingService;
use swap_api::AppState;
use swap_core::{AppConfig, ErrorReporter, LogReporter};

/// Path of a JSON [`AppConfig`] file
pub const CONFIG_ENV: &str = "SWAPD_CONFIG";
/// Overrides the configured API port
pub const PORT_ENV: &str = "SWAPD_PORT";

/// Build the configuration from an optional file and port override
pub fn load_config(path: Option<&str>, port: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config file {}", path))?
        }
        None => AppConfig::default(),
    };
    if let Some(port) = port {
        config.api_port = port
            .parse()
            .with_context(|| format!("invalid {} value {:?}", PORT_ENV, port))?;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Create every service and load the initial bridge and staking figures
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let adapters = config
        .chains
        .iter()
        .fold(ChainAdapters::new(), |adapters, chain| {
            adapters.with_reader(Arc::new(RpcReadAdapter::from_config(chain)))
        });
    let ledger = Arc::new(HttpLedgerClient::new(&config.ledger).context("creating ledger client")?);
    let allowances = Arc::new(AllowanceManager::new());
    let reporter: Arc<dyn ErrorReporter> = Arc::new(LogReporter);

    let bridges = Arc::new(BridgeService::new(
        &config.bridge,
        adapters.clone(),
        ledger.clone(),
        allowances.clone(),
        reporter.clone(),
    ));
    bridges.load_all().await;

    let trades = Arc::new(InstantTradeService::new(
        ProviderConfig::defaults(),
        adapters.clone(),
        allowances.clone(),
    ));

    let staking = config.staking.clone().map(|staking| {
        Arc::new(
            StakingService::new(
                staking,
                adapters,
                ledger,
                Arc::clone(&bridges),
                allowances,
                reporter,
            )
            .with_net_mode(config.net_mode),
        )
    });

    let mut state = AppState::new(config, bridges, trades);
    if let Some(staking) = staking {
        staking.initialize(None).await;
        // detached; runs for the lifetime of the process
        let _ = staking.watch_token_price();
        state = state.with_staking(staking);
    }
    Ok(state)
}

/// Run the daemon until the server stops
pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,swapd=debug")),
        )
        .init();

    let config = load_config(
        std::env::var(CONFIG_ENV).ok().as_deref(),
        std::env::var(PORT_ENV).ok().as_deref(),
    )?;
    tracing::info!(
        net_mode = %config.net_mode,
        addr = %config.api_addr(),
        "Starting swapd"
    );

    let state = build_state(config).await?;
    swap_api::start_server(state)
        .await
        .context("API server stopped")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_with_port_override() {
        let config = load_config(None, Some("8088")).unwrap();
        assert_eq!(config.api_port, 8088);
        assert!(config.staking.is_none());
        assert_eq!(config.bridge.routes.len(), 2);
    }

    #[test]
    fn test_zero_price_refresh_rejected() {
        let path = std::env::temp_dir().join(format!("swapd-staking-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{
                "net_mode": "mainnet",
                "staking": {
                    "staking_contract": "0x4242424242424242424242424242424242424242",
                    "price_refresh_ms": 0
                }
            }"#,
        )
        .unwrap();

        let err = load_config(path.to_str(), None).unwrap_err();
        std::fs::remove_file(path).unwrap();
        assert!(format!("{:#}", err).contains("price_refresh_ms"));
    }

    #[test]
    fn test_invalid_port() {
        assert!(load_config(None, Some("not-a-port")).is_err());
    }

    #[test]
    fn test_config_file() {
        let path = std::env::temp_dir().join(format!("swapd-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "net_mode": "testnet", "api_host": "0.0.0.0", "api_port": 9100 }"#,
        )
        .unwrap();

        let config = load_config(path.to_str(), None).unwrap();
        assert_eq!(config.api_addr().to_string(), "0.0.0.0:9100");
        assert_eq!(config.net_mode.as_str(), "testnet");
        std::fs::remove_file(path).unwrap();

        assert!(load_config(Some("/nonexistent/swapd.json"), None).is_err());
    }
}
