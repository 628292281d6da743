use std::collections::BTreeMap;

use alloy_primitives::Address;

use crate::core::ActionKind;
use crate::domain::{Profile, ProfileState};
use crate::infrastructure::wallet::Signer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Last connect attempt failed; behaves like `Disconnected`
    Error,
}

/// In-memory session record. One per [`super::SessionManager`].
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub status: ConnectionStatus,
    pub account: Option<Address>,
    pub signer: Option<Signer>,
    /// Network the wallet reported after the last check
    pub chain_id: Option<u64>,
    pub profile: ProfileState,
    /// Human-readable message of the last session-level failure
    pub error: Option<String>,
    generation: u64,
    pending: BTreeMap<u64, ActionKind>,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.account.is_some()
    }

    pub fn is_connecting(&self) -> bool {
        self.status == ConnectionStatus::Connecting
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.profile()
    }

    pub fn is_pending(&self, kind: &ActionKind) -> bool {
        self.pending.values().any(|pending| pending == kind)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Account and generation usable for a write, if the session can sign
    pub(crate) fn active_signer(&self) -> Option<(Address, u64)> {
        if !self.is_connected() {
            return None;
        }
        self.signer.map(|signer| (signer.address, self.generation))
    }

    pub(crate) fn establish(&mut self, account: Address, signer: Signer) {
        self.status = ConnectionStatus::Connected;
        self.account = Some(account);
        self.signer = Some(signer);
        self.profile = ProfileState::NotFetched;
        self.error = None;
        self.generation += 1;
    }

    /// Replace the active account; the signer and profile belong to the
    /// old one and are dropped.
    pub(crate) fn swap_account(&mut self, account: Address) {
        self.account = Some(account);
        self.signer = None;
        self.profile = ProfileState::NotFetched;
        self.generation += 1;
    }

    pub(crate) fn clear_session(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        self.account = None;
        self.signer = None;
        self.profile = ProfileState::NotFetched;
        self.error = None;
        self.generation += 1;
    }

    /// Back to the initial state. The generation keeps counting so that
    /// anything in flight sees the reset.
    pub(crate) fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = SessionState::default();
        self.generation = generation;
    }

    pub(crate) fn mark_pending(&mut self, token: u64, kind: ActionKind) {
        self.pending.insert(token, kind);
    }

    pub(crate) fn clear_pending(&mut self, token: u64) {
        self.pending.remove(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> Signer {
        Signer {
            address: Address::repeat_byte(0xaa),
        }
    }

    #[test]
    fn test_establish_and_clear() {
        let mut state = SessionState::default();
        assert!(state.active_signer().is_none());

        state.establish(signer().address, signer());
        assert!(state.is_connected());
        let (account, generation) = state.active_signer().unwrap();
        assert_eq!(account, signer().address);

        state.clear_session();
        assert!(!state.is_connected());
        assert!(state.account.is_none());
        assert!(state.generation() > generation);
    }

    #[test]
    fn test_swap_drops_signer_until_reacquired() {
        let mut state = SessionState::default();
        state.establish(signer().address, signer());
        state.profile = ProfileState::Absent;

        state.swap_account(Address::repeat_byte(0xbb));
        assert_eq!(state.account, Some(Address::repeat_byte(0xbb)));
        assert_eq!(state.profile, ProfileState::NotFetched);
        assert!(state.active_signer().is_none());
    }

    #[test]
    fn test_pending_tracks_tokens() {
        let mut state = SessionState::default();
        state.mark_pending(1, ActionKind::CreateTweet);
        state.mark_pending(2, ActionKind::CreateTweet);
        state.clear_pending(1);
        assert!(state.is_pending(&ActionKind::CreateTweet));
        state.clear_pending(2);
        assert!(!state.is_pending(&ActionKind::CreateTweet));
    }

    #[test]
    fn test_reset_keeps_generation_moving() {
        let mut state = SessionState::default();
        state.establish(signer().address, signer());
        state.mark_pending(7, ActionKind::SetProfile);
        let before = state.generation();

        state.reset();
        assert_eq!(state.status, ConnectionStatus::Disconnected);
        assert_eq!(state.pending_count(), 0);
        assert!(state.generation() > before);
    }
}
