//! Write-action dispatch: pending tracking, confirmation, refresh

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tracing::{debug, warn};

use super::SessionManager;
use crate::core::{ActionKind, ActionOutcome, ContractError, SessionError, TxHandle};
use crate::infrastructure::contracts::SocialContracts;

/// Marks an action pending for as long as it lives.
///
/// Released on every exit path, including when the dispatching future is
/// dropped before completion.
struct InFlight<'a> {
    manager: &'a SessionManager,
    token: u64,
}

impl<'a> InFlight<'a> {
    fn acquire(manager: &'a SessionManager, kind: ActionKind) -> Self {
        let token = manager.inner.next_token.fetch_add(1, Ordering::Relaxed);
        manager.update(|state| state.mark_pending(token, kind));
        Self { manager, token }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let token = self.token;
        self.manager.update(|state| state.clear_pending(token));
    }
}

impl SessionManager {
    /// True while an action of this kind is in flight
    pub fn is_pending(&self, kind: &ActionKind) -> bool {
        self.snapshot().is_pending(kind)
    }

    pub async fn create_tweet<F, Fut>(&self, content: &str, refresh: F) -> ActionOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let content = content.to_string();
        self.dispatch(
            ActionKind::CreateTweet,
            |contracts, from| async move { contracts.create_tweet(from, &content).await },
            refresh,
        )
        .await
    }

    pub async fn like_tweet<F, Fut>(&self, author: Address, id: U256, refresh: F) -> ActionOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        self.dispatch(
            ActionKind::LikeTweet { author, id },
            |contracts, from| async move { contracts.like_tweet(from, author, id).await },
            refresh,
        )
        .await
    }

    /// Write the profile; on confirmation the session's own profile is
    /// re-fetched before `refresh` runs.
    pub async fn set_profile<F, Fut>(&self, display_name: &str, bio: &str, refresh: F) -> ActionOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let display_name = display_name.to_string();
        let bio = bio.to_string();
        self.dispatch(
            ActionKind::SetProfile,
            |contracts, from| async move { contracts.set_profile(from, &display_name, &bio).await },
            refresh,
        )
        .await
    }

    async fn dispatch<W, WFut, F, Fut>(&self, kind: ActionKind, write: W, refresh: F) -> ActionOutcome
    where
        W: FnOnce(Arc<dyn SocialContracts>, Address) -> WFut,
        WFut: Future<Output = Result<TxHandle, ContractError>>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let Some((from, generation)) = self.update(|state| state.active_signer()) else {
            debug!(action = kind.label(), "no active session, skipping");
            return ActionOutcome::Skipped;
        };

        let _in_flight = InFlight::acquire(self, kind.clone());
        let _serialized = match &self.inner.write_lock {
            Some(lock) => {
                let guard = lock.lock().await;
                // Queued behind another write; the session may be gone by now.
                if !self.is_current(generation) {
                    debug!(action = kind.label(), "session changed while queued, not sending");
                    return ActionOutcome::Detached;
                }
                Some(guard)
            }
            None => None,
        };

        let contracts = self.inner.contracts.clone();
        let result = async {
            let tx = write(contracts.clone(), from).await?;
            contracts.confirm(tx).await?;
            Ok::<_, ContractError>(tx)
        }
        .await;

        let tx = match result {
            Ok(tx) => tx,
            Err(err) => {
                warn!(action = kind.label(), "write failed: {err}");
                let failure = SessionError::write_failed(&err, kind.fallback_message());
                return ActionOutcome::Failed(failure.to_string());
            }
        };

        if !self.is_current(generation) {
            debug!(action = kind.label(), hash = %tx.hash, "session changed, dropping completion");
            return ActionOutcome::Detached;
        }
        if kind == ActionKind::SetProfile {
            self.load_profile(from, generation).await;
        }
        refresh().await;
        ActionOutcome::Confirmed(tx)
    }
}
