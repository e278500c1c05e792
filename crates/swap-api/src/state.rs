//! Application state shared by the route handlers

use std::sync::Arc;

use bridge::BridgeService;
use instant_trade::InstantTradeService;
use staking::StakingService;
use swap_core::AppConfig;

use crate::session::SessionService;

/// Services behind the API; cheap to clone
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    bridges: Arc<BridgeService>,
    trades: Arc<InstantTradeService>,
    staking: Option<Arc<StakingService>>,
    session: Option<Arc<SessionService>>,
}

impl AppState {
    pub fn new(config: AppConfig, bridges: Arc<BridgeService>, trades: Arc<InstantTradeService>) -> Self {
        Self {
            config: Arc::new(config),
            bridges,
            trades,
            staking: None,
            session: None,
        }
    }

    pub fn with_staking(mut self, staking: Arc<StakingService>) -> Self {
        self.staking = Some(staking);
        self
    }

    pub fn with_session(mut self, session: Arc<SessionService>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn bridges(&self) -> &BridgeService {
        &self.bridges
    }

    pub fn trades(&self) -> &InstantTradeService {
        &self.trades
    }

    /// `None` when no staking contract is configured
    pub fn staking(&self) -> Option<&Arc<StakingService>> {
        self.staking.as_ref()
    }

    /// `None` when the process runs without a wallet
    pub fn session(&self) -> Option<&Arc<SessionService>> {
        self.session.as_ref()
    }
}
