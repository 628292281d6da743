//! Write actions dispatched through the session manager

use alloy_primitives::{Address, B256, U256};

/// Handle to a submitted write. The write is durable only once the
/// contract layer confirms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHandle {
    pub hash: B256,
}

impl TxHandle {
    pub fn new(hash: B256) -> Self {
        Self { hash }
    }
}

/// The write actions a session can dispatch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateTweet,
    LikeTweet { author: Address, id: U256 },
    SetProfile,
}

impl ActionKind {
    /// Message shown when a write fails without a structured reason
    pub fn fallback_message(&self) -> &'static str {
        match self {
            ActionKind::CreateTweet => "Failed to post tweet. Only registered users can post!",
            ActionKind::LikeTweet { .. } => "Action failed. Make sure you have a profile!",
            ActionKind::SetProfile => "Failed to set profile. Check your wallet.",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::CreateTweet => "createTweet",
            ActionKind::LikeTweet { .. } => "likeTweet",
            ActionKind::SetProfile => "setProfile",
        }
    }
}

/// Result of dispatching a write action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// No active session or account; nothing was sent
    Skipped,
    /// The write was confirmed and the refresh callback ran
    Confirmed(TxHandle),
    /// The write failed; the message is ready for display
    Failed(String),
    /// The session changed while the write was in flight
    Detached,
}

impl ActionOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ActionOutcome::Confirmed(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ActionOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }
}
