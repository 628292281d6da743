//! Wallet session lifecycle

use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy_primitives::Address;
use tracing::{debug, info, warn};

use super::state::{ConnectionStatus, SessionState};
use crate::config::{NetworkConfig, SessionConfig};
use crate::core::{SessionError, WalletError};
use crate::domain::ProfileState;
use crate::infrastructure::contracts::SocialContracts;
use crate::infrastructure::wallet::{ChainParams, ProviderEvent, Subscription, WalletProvider};
use crate::store::SessionStore;

/// Owns the session and mediates every contract call made on its behalf.
///
/// Cloning is cheap; clones share the same session. State lives behind a
/// short-lived lock that is never held across an await, so actions on the
/// same manager may overlap.
#[derive(Clone)]
pub struct SessionManager {
    pub(super) inner: Arc<Inner>,
}

pub(super) struct Inner {
    wallet: Option<Arc<dyn WalletProvider>>,
    pub(super) contracts: Arc<dyn SocialContracts>,
    store: Arc<dyn SessionStore>,
    network: NetworkConfig,
    state: Mutex<SessionState>,
    listener: tokio::sync::Mutex<Option<Subscription>>,
    pub(super) write_lock: Option<tokio::sync::Mutex<()>>,
    pub(super) next_token: AtomicU64,
}

impl SessionManager {
    /// `wallet` is `None` when no wallet provider is available to this client.
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        contracts: Arc<dyn SocialContracts>,
        store: Arc<dyn SessionStore>,
        network: NetworkConfig,
        session: &SessionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                wallet,
                contracts,
                store,
                network,
                state: Mutex::new(SessionState::default()),
                listener: tokio::sync::Mutex::new(None),
                write_lock: session.serialize_writes.then(|| tokio::sync::Mutex::new(())),
                next_token: AtomicU64::new(0),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock())
    }

    pub(super) fn is_current(&self, generation: u64) -> bool {
        self.lock().generation() == generation
    }

    /// Copy of the current session
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.lock().status
    }

    pub fn account(&self) -> Option<Address> {
        self.lock().account
    }

    pub fn profile(&self) -> ProfileState {
        self.lock().profile.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_connected()
    }

    pub fn has_wallet(&self) -> bool {
        self.inner.wallet.is_some()
    }

    pub fn contracts(&self) -> Arc<dyn SocialContracts> {
        self.inner.contracts.clone()
    }

    /// First-load initialization: silently restore an already-authorized
    /// session unless the user explicitly disconnected last time.
    pub async fn initialize(&self) {
        match self.inner.store.is_disconnected() {
            Ok(true) => {
                debug!("explicit disconnect on record, not reconnecting");
                return;
            }
            Ok(false) => {}
            Err(err) => warn!("could not read disconnect flag: {err:#}"),
        }

        let Some(wallet) = self.inner.wallet.clone() else {
            debug!("no wallet provider, staying disconnected");
            return;
        };
        self.ensure_listening(wallet.as_ref()).await;

        let attempt = self.lock().generation();
        let restored = async {
            let accounts = wallet.accounts().await?;
            let Some(&account) = accounts.first() else {
                return Ok(None);
            };
            let signer = wallet.signing_identity(account).await?;
            Ok::<_, WalletError>(Some((account, signer)))
        }
        .await;

        match restored {
            Ok(Some((account, signer))) => {
                let generation = self.update(|state| {
                    (state.generation() == attempt).then(|| {
                        state.establish(account, signer);
                        state.generation()
                    })
                });
                if let Some(generation) = generation {
                    info!(%account, "restored wallet session");
                    self.load_profile(account, generation).await;
                }
            }
            Ok(None) => debug!("wallet has no authorized accounts"),
            Err(err) => warn!("auto-connect failed: {err}"),
        }
    }

    /// Explicit connect. Prompts the wallet for authorization.
    pub async fn connect(&self) -> Result<(), SessionError> {
        let Some(wallet) = self.inner.wallet.clone() else {
            let err = SessionError::ProviderNotFound;
            self.update(|state| {
                state.status = ConnectionStatus::Error;
                state.error = Some(err.to_string());
            });
            return Err(err);
        };

        let attempt = self.update(|state| {
            state.status = ConnectionStatus::Connecting;
            state.error = None;
            state.generation()
        });
        self.ensure_listening(wallet.as_ref()).await;

        let authorized = async {
            let accounts = wallet.request_accounts().await?;
            let account = *accounts.first().ok_or(WalletError::NoAccounts)?;
            let signer = wallet.signing_identity(account).await?;
            Ok::<_, WalletError>((account, signer))
        }
        .await;

        let (account, signer) = match authorized {
            Ok(authorized) => authorized,
            Err(err) => {
                if err.is_user_rejection() {
                    info!("wallet connection rejected by user");
                } else {
                    warn!("wallet connection failed: {err}");
                }
                let err = SessionError::connect_failed(&err);
                self.update(|state| {
                    if state.generation() == attempt {
                        state.status = ConnectionStatus::Error;
                        state.error = Some(err.to_string());
                    }
                });
                return Err(err);
            }
        };

        let generation = self.update(|state| {
            (state.generation() == attempt).then(|| {
                state.establish(account, signer);
                state.generation()
            })
        });
        let Some(generation) = generation else {
            info!(%account, "session changed while connecting, dropping authorization");
            return Err(SessionError::Superseded);
        };
        info!(%account, "wallet connected");

        self.load_profile(account, generation).await;
        if let Err(err) = self.inner.store.set_disconnected(false) {
            warn!("could not clear disconnect flag: {err:#}");
        }
        self.ensure_network(wallet.as_ref(), generation).await;
        Ok(())
    }

    /// Explicit disconnect. Suppresses auto-reconnect on the next load.
    pub fn disconnect(&self) {
        self.update(SessionState::clear_session);
        if let Err(err) = self.inner.store.set_disconnected(true) {
            warn!("could not persist disconnect flag: {err:#}");
        }
        info!("wallet disconnected");
    }

    /// Read a profile. Failures are logged and read as "no profile".
    pub async fn fetch_profile(&self, account: Address) -> ProfileState {
        match self.inner.contracts.get_profile(account).await {
            Ok(record) => ProfileState::from_decoded(record.decode()),
            Err(err) => {
                warn!(%account, "failed to fetch profile: {err}");
                ProfileState::Absent
            }
        }
    }

    /// Re-fetch the active account's profile
    pub async fn refresh_profile(&self) {
        let active = self.update(|state| state.account.map(|account| (account, state.generation())));
        if let Some((account, generation)) = active {
            self.load_profile(account, generation).await;
        }
    }

    pub(super) async fn load_profile(&self, account: Address, generation: u64) {
        let profile = self.fetch_profile(account).await;
        self.update(|state| {
            if state.generation() == generation {
                state.profile = profile;
            }
        });
    }

    async fn ensure_network(&self, wallet: &dyn WalletProvider, generation: u64) {
        let target = self.inner.network.chain_id;
        let checked = async {
            let current = wallet.chain_id().await?;
            if current == target {
                return Ok(current);
            }
            info!(current, target, "switching wallet network");
            match wallet.switch_chain(target).await {
                Ok(()) => Ok(target),
                Err(WalletError::UnrecognizedChain(_)) => {
                    info!(target, "network unknown to wallet, adding it");
                    wallet.add_chain(&ChainParams::from(&self.inner.network)).await?;
                    Ok(target)
                }
                Err(err) => Err(err),
            }
        }
        .await;

        self.update(|state| {
            if state.generation() != generation {
                return;
            }
            match checked {
                Ok(chain_id) => state.chain_id = Some(chain_id),
                Err(err) => {
                    warn!("network switch failed: {err}");
                    state.error = Some(err.to_string());
                }
            }
        });
    }

    async fn ensure_listening(&self, wallet: &dyn WalletProvider) {
        let mut listener = self.inner.listener.lock().await;
        if listener.is_some() {
            return;
        }
        match wallet.subscribe().await {
            Ok(subscription) => *listener = Some(subscription),
            Err(err) => warn!("could not subscribe to wallet events: {err}"),
        }
    }

    /// Apply a wallet notification
    pub async fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    // Wallet-side logout; the disconnect flag stays as it was.
                    let cleared = self.update(|state| {
                        let had_account = state.account.is_some();
                        if had_account {
                            state.clear_session();
                        }
                        had_account
                    });
                    if cleared {
                        info!("wallet removed all accounts");
                    }
                }
                Some(&account) => self.switch_account(account).await,
            },
            ProviderEvent::ChainChanged(chain_id) => {
                info!(chain_id, "wallet network changed, reloading session");
                self.reload().await;
            }
        }
    }

    async fn switch_account(&self, account: Address) {
        let generation = self.update(|state| {
            if state.status != ConnectionStatus::Connected || state.account == Some(account) {
                return None;
            }
            state.swap_account(account);
            Some(state.generation())
        });
        let Some(generation) = generation else {
            return;
        };
        info!(%account, "active account changed");

        let Some(wallet) = self.inner.wallet.clone() else {
            return;
        };
        match wallet.signing_identity(account).await {
            Ok(signer) => self.update(|state| {
                if state.generation() == generation {
                    state.signer = Some(signer);
                }
            }),
            Err(err) => warn!(%account, "could not acquire signer: {err}"),
        }
    }

    /// Wait for the next wallet notification. `None` when not listening.
    pub async fn next_event(&self) -> Option<ProviderEvent> {
        let mut listener = self.inner.listener.lock().await;
        listener.as_mut()?.recv().await
    }

    /// Apply every notification already queued, without waiting
    pub async fn process_pending_events(&self) -> usize {
        let mut handled = 0;
        loop {
            let event = {
                let mut listener = self.inner.listener.lock().await;
                listener.as_mut().and_then(Subscription::try_recv)
            };
            let Some(event) = event else {
                return handled;
            };
            self.handle_event(event).await;
            handled += 1;
        }
    }

    /// Follow wallet notifications until the listener goes away
    pub async fn watch(&self) {
        while let Some(event) = self.next_event().await {
            self.handle_event(event).await;
        }
    }

    /// Discard all in-memory state and initialize from scratch
    pub async fn reload(&self) {
        self.inner.listener.lock().await.take();
        self.update(SessionState::reset);
        self.initialize().await;
    }

    /// Release the wallet listener
    pub async fn shutdown(&self) {
        self.inner.listener.lock().await.take();
    }
}
