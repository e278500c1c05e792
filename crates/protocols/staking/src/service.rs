//! Stake orchestration and live staking figures
//!
//! Every figure lives in a [`Published`] point that is only written here.
//! A failed read is reported and resets its point to zero (or empty) rather
//! than leaving a stale value behind. Ledger writes that follow a mined
//! `enter`/`leave` are reported on failure but never fail the action.

use std::sync::{Arc, Mutex};

use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use bridge::{BridgeService, RubicBridge};
use chain_adapter::{decode_returns, AllowanceManager, AllowanceRequest, ChainAdapters, ContractCall};
use ledger_client::{BridgeTxHashNotice, DepositRecord, LedgerBackend};
use rust_decimal::Decimal;
use swap_core::{
    from_smallest_unit, to_smallest_unit, Error, ErrorReporter, OnTransactionHash, ProtocolError,
    NetMode, Published, Result, StakeContext, StakeToken, StakingConfig, TransferRequest,
    TxReceipt, WalletContext, INFINITE_ALLOWANCE,
};
use tokio::task::JoinHandle;

use crate::constants::{IStaking, STAKE_DECIMALS};
use crate::state::{StakeEntry, StakingState};

/// Redeemable amount minus recorded deposit, never negative
pub fn earned_rewards(amount_with_rewards: Decimal, users_deposit: Decimal) -> Decimal {
    (amount_with_rewards - users_deposit).max(Decimal::ZERO)
}

fn stake_units(amount: Decimal, decimals: u8) -> std::result::Result<U256, ProtocolError> {
    if amount <= Decimal::ZERO {
        return Err(ProtocolError::InvalidAmount {
            message: format!("{} must be greater than zero", amount),
        });
    }
    to_smallest_unit(amount, decimals)
}

/// Publish points of the staking view. Amounts are in token units.
#[derive(Debug)]
pub struct StakingPoints {
    pub amount_with_rewards: Published<Decimal>,
    pub apr: Published<Decimal>,
    pub refill_time: Published<String>,
    pub user_entered_amount: Published<Decimal>,
    pub total_entered: Published<Decimal>,
    pub staking_token_balance: Published<Decimal>,
    pub earned_rewards: Published<Decimal>,
    pub max_withdraw: Published<Decimal>,
    pub users_total_deposit: Published<Decimal>,
    pub selected_token_balance: Published<Decimal>,
    pub token_price: Published<Option<Decimal>>,
    pub progress_loading: Published<bool>,
    pub statistics_loading: Published<bool>,
}

impl Default for StakingPoints {
    fn default() -> Self {
        Self {
            amount_with_rewards: Published::default(),
            apr: Published::default(),
            refill_time: Published::default(),
            user_entered_amount: Published::default(),
            total_entered: Published::default(),
            staking_token_balance: Published::default(),
            earned_rewards: Published::default(),
            max_withdraw: Published::default(),
            users_total_deposit: Published::default(),
            selected_token_balance: Published::default(),
            token_price: Published::default(),
            progress_loading: Published::new(true),
            statistics_loading: Published::new(false),
        }
    }
}

pub struct StakingService {
    config: StakingConfig,
    net_mode: NetMode,
    adapters: ChainAdapters,
    ledger: Arc<dyn LedgerBackend>,
    bridges: Arc<BridgeService>,
    allowances: Arc<AllowanceManager>,
    reporter: Arc<dyn ErrorReporter>,
    bridge_contract: Mutex<Option<String>>,
    points: StakingPoints,
}

impl StakingService {
    pub fn new(
        config: StakingConfig,
        adapters: ChainAdapters,
        ledger: Arc<dyn LedgerBackend>,
        bridges: Arc<BridgeService>,
        allowances: Arc<AllowanceManager>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            config,
            net_mode: NetMode::Mainnet,
            adapters,
            ledger,
            bridges,
            allowances,
            reporter,
            bridge_contract: Mutex::new(None),
            points: StakingPoints::default(),
        }
    }

    pub fn with_net_mode(mut self, net_mode: NetMode) -> Self {
        self.net_mode = net_mode;
        self
    }

    pub fn config(&self) -> &StakingConfig {
        &self.config
    }

    pub fn points(&self) -> &StakingPoints {
        &self.points
    }

    pub fn snapshot(&self) -> StakingState {
        let p = &self.points;
        StakingState {
            amount_with_rewards: p.amount_with_rewards.get(),
            apr: p.apr.get(),
            refill_time: p.refill_time.get(),
            user_entered_amount: p.user_entered_amount.get(),
            total_entered: p.total_entered.get(),
            staking_token_balance: p.staking_token_balance.get(),
            earned_rewards: p.earned_rewards.get(),
            max_withdraw: p.max_withdraw.get(),
            users_total_deposit: p.users_total_deposit.get(),
            selected_token_balance: p.selected_token_balance.get(),
            token_price: p.token_price.get(),
            progress_loading: p.progress_loading.get(),
            statistics_loading: p.statistics_loading.get(),
        }
    }

    /// Tokens that can be staked: the native stake token plus every bridge
    /// route source that lands on the native chain
    pub fn stake_tokens(&self) -> Vec<StakeToken> {
        let native = StakeToken {
            blockchain: self.config.native_chain,
            address: self.config.stake_token,
            decimals: STAKE_DECIMALS,
        };
        std::iter::once(native)
            .chain(
                self.bridges
                    .bridges()
                    .iter()
                    .map(|b| b.route())
                    .filter(|route| route.to.blockchain == self.config.native_chain)
                    .map(|route| StakeToken {
                        blockchain: route.from.blockchain,
                        address: route.from.token_address,
                        decimals: route.from.decimals,
                    }),
            )
            .collect()
    }

    fn report(&self, context: &str, error: impl Into<Error>) {
        self.reporter.report(context, &error.into());
    }

    /// Write `result` to `point`, or report and reset it to zero
    fn settle(&self, context: &str, point: &Published<Decimal>, result: Result<Decimal>) -> Decimal {
        let value = result.unwrap_or_else(|e| {
            self.report(context, e);
            Decimal::ZERO
        });
        point.set(value);
        value
    }

    fn allowance_request(&self, token: &StakeToken, wallet: &WalletContext, required: U256) -> AllowanceRequest {
        AllowanceRequest {
            chain: token.blockchain,
            token: token.address,
            owner: wallet.address,
            spender: self.config.staking_contract,
            required,
        }
    }

    /// Run a staking view call and scale the `uint256` it returns
    async fn read_stake_amount<C>(
        &self,
        call: C,
        amount: fn(C::Return) -> U256,
    ) -> Result<Decimal>
    where
        C: SolCall + Send,
    {
        let read = self.adapters.read(self.config.native_chain)?;
        let output = read
            .call_contract_method(self.config.staking_contract, &ContractCall::new(call))
            .await?;
        let units = amount(decode_returns::<C>(&output)?);
        Ok(from_smallest_unit(units, STAKE_DECIMALS)?)
    }

    // ---- reads ----

    pub async fn fetch_total_entered(&self) -> Decimal {
        let result = self
            .read_stake_amount(IStaking::totalRBCEnteredCall {}, |r| r.total)
            .await;
        self.settle("total_entered", &self.points.total_entered, result)
    }

    pub async fn fetch_user_entered_amount(&self, wallet: &WalletContext) -> Decimal {
        let result = self
            .read_stake_amount(
                IStaking::userEnteredAmountCall {
                    owner: wallet.address,
                },
                |r| r.entered,
            )
            .await;
        self.settle("user_entered_amount", &self.points.user_entered_amount, result)
    }

    /// xBRBC held by the wallet
    pub async fn fetch_staking_token_balance(&self, wallet: &WalletContext) -> Decimal {
        let result = async {
            let read = self.adapters.read(self.config.native_chain)?;
            let units = read
                .get_token_balance(wallet.address, self.config.staking_contract)
                .await?;
            Ok::<_, Error>(from_smallest_unit(units, STAKE_DECIMALS)?)
        }
        .await;
        self.settle("staking_token_balance", &self.points.staking_token_balance, result)
    }

    pub async fn fetch_amount_with_rewards(&self, staking_token_balance: Decimal) -> Decimal {
        let result = self.calculate_leave_reward(staking_token_balance).await;
        self.settle("amount_with_rewards", &self.points.amount_with_rewards, result)
    }

    /// Compare the redeemable amount with the ledger's deposit record
    pub async fn fetch_earned_rewards(&self, wallet: &WalletContext, amount_with_rewards: Decimal) -> Decimal {
        let deposit = async {
            let units = self.ledger.fetch_users_deposit(wallet.address).await?;
            Ok::<_, Error>(from_smallest_unit(units, STAKE_DECIMALS)?)
        }
        .await;

        let earned = match deposit {
            Ok(deposit) => {
                self.points.users_total_deposit.set(deposit);
                earned_rewards(amount_with_rewards, deposit)
            }
            Err(e) => {
                self.report("users_deposit", e);
                self.points.users_total_deposit.set(Decimal::ZERO);
                Decimal::ZERO
            }
        };
        self.points.earned_rewards.set(earned);
        earned
    }

    pub async fn fetch_apr(&self) -> Decimal {
        let result = self.ledger.fetch_apr().await.map_err(Error::from);
        self.settle("apr", &self.points.apr, result)
    }

    pub async fn fetch_refill_time(&self) -> String {
        let refill_time = self.ledger.fetch_refill_time().await.unwrap_or_else(|e| {
            self.report("refill_time", e);
            String::new()
        });
        self.points.refill_time.set(refill_time.clone());
        refill_time
    }

    /// xBRBC the wallet can withdraw right now
    pub async fn refresh_max_withdraw(&self, wallet: &WalletContext) -> Decimal {
        let result = self
            .read_stake_amount(
                IStaking::actualBalanceOfCall {
                    owner: wallet.address,
                },
                |r| r.balance,
            )
            .await;
        self.settle("max_withdraw", &self.points.max_withdraw, result)
    }

    /// Balance of the selected token. Without a wallet every wallet-scoped
    /// figure is cleared.
    pub async fn refresh_selected_token_balance(&self, ctx: Option<&StakeContext>) -> Decimal {
        let Some(ctx) = ctx else {
            self.points.amount_with_rewards.set(Decimal::ZERO);
            self.points.earned_rewards.set(Decimal::ZERO);
            self.points.staking_token_balance.set(Decimal::ZERO);
            self.points.selected_token_balance.set(Decimal::ZERO);
            return Decimal::ZERO;
        };

        let result = async {
            let read = self.adapters.read(ctx.token.blockchain)?;
            let units = read
                .get_token_balance(ctx.wallet.address, ctx.token.address)
                .await?;
            Ok::<_, Error>(from_smallest_unit(units, ctx.token.decimals)?)
        }
        .await;
        self.settle("selected_token_balance", &self.points.selected_token_balance, result)
    }

    /// BRBC received for redeeming `amount` xBRBC
    pub async fn calculate_leave_reward(&self, amount: Decimal) -> Result<Decimal> {
        if amount.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let units = to_smallest_unit(amount, STAKE_DECIMALS)?;
        self.read_stake_amount(IStaking::canReceiveCall { amount: units }, |r| r.received)
            .await
    }

    /// APR, then (with a wallet) balance, redeemable amount and earned rewards
    pub async fn reload_statistics(&self, wallet: Option<&WalletContext>) {
        self.points.statistics_loading.set(true);
        self.fetch_apr().await;
        if let Some(wallet) = wallet {
            let balance = self.fetch_staking_token_balance(wallet).await;
            let amount_with_rewards = self.fetch_amount_with_rewards(balance).await;
            self.fetch_earned_rewards(wallet, amount_with_rewards).await;
        }
        self.points.statistics_loading.set(false);
    }

    /// Pool total and (with a wallet) the user's entered amount
    pub async fn reload_progress(&self, wallet: Option<&WalletContext>) {
        self.points.progress_loading.set(true);
        match wallet {
            Some(wallet) => {
                tokio::join!(
                    self.fetch_total_entered(),
                    self.fetch_user_entered_amount(wallet)
                );
            }
            None => {
                self.fetch_total_entered().await;
            }
        }
        self.points.progress_loading.set(false);
    }

    /// First load of every figure
    pub async fn initialize(&self, wallet: Option<&WalletContext>) {
        tokio::join!(
            self.fetch_total_entered(),
            self.fetch_apr(),
            self.fetch_refill_time()
        );
        self.points.progress_loading.set(false);

        if let Some(wallet) = wallet {
            self.points.statistics_loading.set(true);
            let (amount_with_rewards, _, _) = tokio::join!(
                async {
                    let balance = self.fetch_staking_token_balance(wallet).await;
                    self.fetch_amount_with_rewards(balance).await
                },
                self.fetch_user_entered_amount(wallet),
                self.refresh_max_withdraw(wallet)
            );
            self.fetch_earned_rewards(wallet, amount_with_rewards).await;
            self.points.statistics_loading.set(false);
        }

        if let Err(e) = self.bridge_contract_address().await {
            self.report("bridge_contract_address", e);
        }
        tracing::info!(
            contract = %self.config.staking_contract,
            with_wallet = wallet.is_some(),
            "Staking initialized"
        );
    }

    // ---- price ----

    pub async fn refresh_token_price(&self) -> Option<Decimal> {
        let price = match self
            .ledger
            .fetch_token_price(self.config.native_chain, self.config.stake_token)
            .await
        {
            Ok(price) => Some(price),
            Err(e) => {
                self.report("token_price", e);
                None
            }
        };
        self.points.token_price.set(price);
        price
    }

    /// Refresh the reference price now and then every `price_refresh_ms`
    pub fn watch_token_price(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let period = self.config.price_refresh_period();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                service.refresh_token_price().await;
            }
        })
    }

    /// Display-only USD value; `None` while the price is unknown
    pub fn calculate_usd_price(&self, amount: Decimal) -> Option<Decimal> {
        self.points.token_price.get().map(|price| amount * price)
    }

    // ---- enter / leave ----

    pub async fn needs_approval(&self, ctx: &StakeContext, amount: Decimal) -> Result<bool> {
        let units = stake_units(amount, ctx.token.decimals)?;
        let read = self.adapters.read(ctx.token.blockchain)?;
        let needed = chain_adapter::needs_approval(
            read.as_ref(),
            &self.allowance_request(&ctx.token, &ctx.wallet, units),
        )
        .await?;
        Ok(needed)
    }

    /// Approve the staking contract for an unlimited amount
    pub async fn approve_tokens(&self, ctx: &StakeContext) -> Result<TxReceipt> {
        let write = self.adapters.write(ctx.token.blockchain)?;
        let receipt = self
            .allowances
            .approve(
                write.as_ref(),
                &self.allowance_request(&ctx.token, &ctx.wallet, INFINITE_ALLOWANCE),
                None,
            )
            .await?;
        Ok(receipt)
    }

    /// Stake `amount` of the selected token. Tokens off the native chain are
    /// bridged to the staking contract instead.
    pub async fn enter_stake(&self, ctx: &StakeContext, amount: Decimal) -> Result<StakeEntry> {
        let chain = ctx.token.blockchain;
        if !self.config.is_native_chain(chain, self.net_mode) {
            let receipt = self.enter_stake_via_bridge(ctx, amount).await?;
            return Ok(StakeEntry::Bridged(receipt));
        }

        let units = stake_units(amount, ctx.token.decimals)?;
        let read = self.adapters.read(chain)?;
        let write = self.adapters.write(chain)?;

        self.allowances
            .ensure_allowance(
                read.as_ref(),
                write.as_ref(),
                &self.allowance_request(&ctx.token, &ctx.wallet, units),
            )
            .await?;
        let enter = ContractCall::new(IStaking::enterCall { amount: units });
        let receipt = write
            .try_execute_contract_method(self.config.staking_contract, &enter, None)
            .await?;
        tracing::info!(
            wallet = %ctx.wallet.address,
            %amount,
            tx_hash = %receipt.transaction_hash,
            "Stake entered"
        );

        let record = DepositRecord::new(
            ctx.wallet.address,
            units,
            receipt.transaction_hash.to_string(),
            self.config.network_label.clone(),
        );
        if let Err(e) = self.ledger.update_users_deposit(&record).await {
            self.report("update_users_deposit", e);
        }

        self.reload_progress(Some(&ctx.wallet)).await;
        self.reload_statistics(Some(&ctx.wallet)).await;
        self.refresh_selected_token_balance(Some(ctx)).await;
        Ok(StakeEntry::Direct(receipt))
    }

    /// Redeem `amount` xBRBC
    pub async fn leave_stake(&self, wallet: &WalletContext, amount: Decimal) -> Result<TxReceipt> {
        let units = stake_units(amount, STAKE_DECIMALS)?;
        let write = self.adapters.write(self.config.native_chain)?;
        let leave = ContractCall::new(IStaking::leaveCall { amount: units });
        let receipt = write
            .try_execute_contract_method(self.config.staking_contract, &leave, None)
            .await?;
        tracing::info!(
            wallet = %wallet.address,
            %amount,
            tx_hash = %receipt.transaction_hash,
            "Stake left"
        );

        let record = DepositRecord::new(
            wallet.address,
            units,
            receipt.transaction_hash.to_string(),
            self.config.network_label.clone(),
        );
        if let Err(e) = self.ledger.update_users_deposit_after_withdraw(&record).await {
            self.report("update_users_deposit_after_withdraw", e);
        }

        tokio::join!(
            self.reload_statistics(Some(wallet)),
            self.reload_progress(Some(wallet))
        );
        self.refresh_max_withdraw(wallet).await;
        Ok(receipt)
    }

    // ---- stake via bridge ----

    /// Bridge contract that stakes on arrival; fetched once
    pub async fn bridge_contract_address(&self) -> Result<String> {
        let cached = self
            .bridge_contract
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(address) = cached {
            return Ok(address);
        }

        let address = self.ledger.fetch_bridge_contract_address().await?;
        *self.bridge_contract.lock().unwrap_or_else(|e| e.into_inner()) = Some(address.clone());
        Ok(address)
    }

    async fn bridge_request(
        &self,
        ctx: &StakeContext,
        amount: Decimal,
    ) -> Result<(Arc<RubicBridge>, TransferRequest)> {
        let from = ctx.token.blockchain;
        let to = self.config.native_chain;
        let bridge = self.bridges.bridge_for(from, to)?;
        let pair = bridge
            .pairs()
            .into_iter()
            .find(|pair| {
                pair.token(from)
                    .is_some_and(|token| token.address == ctx.token.address)
            })
            .ok_or_else(|| ProtocolError::StateUnavailable {
                reason: format!("no bridge pair loaded for {} on {}", ctx.token.address, from),
            })?;
        let to_address = self.bridge_contract_address().await?;

        let ledger = Arc::clone(&self.ledger);
        let reporter = Arc::clone(&self.reporter);
        let on_hash: OnTransactionHash = Arc::new(move |tx_hash| {
            let notice = BridgeTxHashNotice {
                tx_hash: tx_hash.to_string(),
                network: from.backend_name().to_string(),
            };
            let ledger = Arc::clone(&ledger);
            let reporter = Arc::clone(&reporter);
            tokio::spawn(async move {
                if let Err(e) = ledger.send_bridge_tx_hash(&notice).await {
                    reporter.report("send_bridge_tx_hash", &e.into());
                }
            });
        });

        let request = TransferRequest {
            from_chain: from,
            to_chain: to,
            pair,
            amount,
            to_address,
            on_transaction_hash: Some(on_hash),
        };
        Ok((bridge, request))
    }

    /// Bridge the selected token to the staking bridge contract
    pub async fn enter_stake_via_bridge(&self, ctx: &StakeContext, amount: Decimal) -> Result<TxReceipt> {
        let (bridge, request) = self.bridge_request(ctx, amount).await?;
        tracing::info!(from = %request.from_chain, %amount, "Staking via bridge");
        bridge.create_trade(&ctx.wallet, &request).await
    }

    pub async fn needs_bridge_approval(&self, ctx: &StakeContext, amount: Decimal) -> Result<bool> {
        let (bridge, request) = self.bridge_request(ctx, amount).await?;
        bridge.needs_approval(&ctx.wallet, &request).await
    }

    pub async fn approve_bridge_tokens(&self, ctx: &StakeContext, amount: Decimal) -> Result<TxReceipt> {
        let (bridge, mut request) = self.bridge_request(ctx, amount).await?;
        // an approval hash is not a bridge transfer
        request.on_transaction_hash = None;
        bridge.approve(&ctx.wallet, &request).await
    }
}

impl std::fmt::Debug for StakingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StakingService")
            .field("staking_contract", &self.config.staking_contract)
            .field("native_chain", &self.config.native_chain)
            .field("net_mode", &self.net_mode)
            .finish()
    }
}
