//! Wallet sign-in session
//!
//! Signing in proves wallet ownership to the backend: the wallet signs a
//! backend-issued nonce and the backend opens a session for that address.
//! When the wallet switches accounts the session follows it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use chain_adapter::WalletAdapter;
use ledger_client::{AuthBackend, SignedNonce, UserProfile};
use serde::Serialize;
use swap_core::{ErrorReporter, ProtocolError, Published, Result};
use tokio::task::JoinHandle;

/// Who the backend thinks the user is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "profile", rename_all = "camelCase")]
pub enum SessionUser {
    /// Not resolved yet
    #[default]
    Unknown,
    Anonymous,
    SignedIn(UserProfile),
}

impl SessionUser {
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::SignedIn(profile) => Some(profile),
            _ => None,
        }
    }
}

pub struct SessionService {
    wallet: Arc<dyn WalletAdapter>,
    auth: Arc<dyn AuthBackend>,
    reporter: Arc<dyn ErrorReporter>,
    user: Published<SessionUser>,
    auth_in_progress: AtomicBool,
}

impl SessionService {
    pub fn new(
        wallet: Arc<dyn WalletAdapter>,
        auth: Arc<dyn AuthBackend>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            wallet,
            auth,
            reporter,
            user: Published::default(),
            auth_in_progress: AtomicBool::new(false),
        }
    }

    pub fn user(&self) -> SessionUser {
        self.user.get()
    }

    pub fn subscribe_user(&self) -> tokio::sync::watch::Receiver<SessionUser> {
        self.user.subscribe()
    }

    pub fn is_auth_in_progress(&self) -> bool {
        self.auth_in_progress.load(Ordering::SeqCst)
    }

    /// Resolve the current user from the backend session
    ///
    /// An inactive wallet or a missing session both resolve to anonymous.
    pub async fn fetch_user(&self) -> SessionUser {
        let user = if self.wallet.is_active() {
            match self.auth.fetch_profile().await {
                Ok(profile) => SessionUser::SignedIn(profile),
                Err(e) => {
                    tracing::debug!(error = %e, "No backend session");
                    SessionUser::Anonymous
                }
            }
        } else {
            SessionUser::Anonymous
        };
        self.user.set(user.clone());
        self.auth_in_progress.store(false, Ordering::SeqCst);
        user
    }

    /// Activate the wallet, sign the backend nonce and open a session
    pub async fn sign_in(&self) -> Result<SessionUser> {
        self.auth_in_progress.store(true, Ordering::SeqCst);
        let result = self.open_session().await;
        match result {
            Ok(()) => Ok(self.fetch_user().await),
            Err(e) => {
                self.auth_in_progress.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn open_session(&self) -> Result<()> {
        self.wallet.activate().await?;
        let nonce = self.auth.fetch_auth_nonce().await?;
        let signed_msg = self.wallet.sign_personal(&nonce).await?;
        let address = self
            .wallet
            .address()
            .ok_or_else(|| ProtocolError::ActionNotAllowed {
                reason: "wallet has no active account".to_string(),
            })?;
        self.auth
            .send_signed_nonce(&SignedNonce {
                address,
                message: nonce,
                signed_msg,
            })
            .await?;
        tracing::info!(%address, "Signed in");
        Ok(())
    }

    /// Close the backend session
    ///
    /// The local session is cleared and the wallet deactivated even when the
    /// backend call fails.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.auth.logout().await;
        self.user.set(SessionUser::Anonymous);
        self.wallet.deactivate();
        result.map_err(Into::into)
    }

    /// React to the wallet switching accounts; returns whether a new
    /// sign-in was started
    pub async fn on_address_change(&self, address: Option<Address>) -> bool {
        if self.is_auth_in_progress() {
            return false;
        }
        let Some(address) = address else {
            return false;
        };
        let stale = match self.user() {
            SessionUser::Unknown => false,
            SessionUser::Anonymous => true,
            SessionUser::SignedIn(profile) => !profile.is_for(address),
        };
        if !stale {
            return false;
        }

        tracing::info!(%address, "Wallet account changed, signing in again");
        if let Err(e) = self.sign_in().await {
            self.reporter.report("session.sign_in", &e);
        }
        true
    }

    /// Follow wallet account switches until the wallet goes away
    pub fn watch_address_changes(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let mut rx = self.wallet.subscribe_address();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let address = *rx.borrow_and_update();
                service.on_address_change(address).await;
            }
        })
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("user", &self.user)
            .field("auth_in_progress", &self.auth_in_progress)
            .finish()
    }
}
