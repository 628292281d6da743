//! Error taxonomy shared by the wallet, contract and session layers

use thiserror::Error;

/// EIP-1193 "user rejected the request"
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-3326 "unrecognized chain id"
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// Failures reported by the wallet provider
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    /// The wallet answered with an error response (user rejection included)
    #[error("{message}")]
    Rejected { code: i64, message: String },

    /// The wallet does not know the requested chain
    #[error("chain {0:#x} has not been added to the wallet")]
    UnrecognizedChain(u64),

    /// Authorization succeeded but returned an empty account list
    #[error("wallet returned no accounts")]
    NoAccounts,

    /// Transport or decoding failure talking to the wallet
    #[error("{0}")]
    Rpc(String),
}

impl WalletError {
    /// Map an error response to a variant, recognizing the EIP codes.
    pub fn from_response(code: i64, message: impl Into<String>, chain_id: u64) -> Self {
        if code == UNRECOGNIZED_CHAIN_CODE {
            WalletError::UnrecognizedChain(chain_id)
        } else {
            WalletError::Rejected {
                code,
                message: message.into(),
            }
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::Rejected { code, .. } if *code == USER_REJECTED_CODE)
    }
}

/// Failures reported by the contract layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    /// The call or transaction reverted. `reason` is the decoded revert
    /// string when the contract supplied one.
    #[error("{}", .reason.as_deref().unwrap_or("transaction reverted"))]
    Reverted { reason: Option<String> },

    #[error("contract call failed: {0}")]
    Transport(String),

    #[error("could not decode {0}")]
    Decode(String),
}

impl ContractError {
    pub fn reverted(reason: impl Into<String>) -> Self {
        ContractError::Reverted {
            reason: Some(reason.into()),
        }
    }

    /// Structured revert reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            ContractError::Reverted { reason } => reason.as_deref().filter(|r| !r.is_empty()),
            _ => None,
        }
    }
}

/// User-facing session failures. `Display` is the message shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No wallet provider detected. Configure a wallet endpoint to use twitter3.")]
    ProviderNotFound,

    #[error("{0}")]
    AuthorizationRejected(String),

    /// A write failed; `reason` is the contract's revert string or the
    /// action's fallback message
    #[error("{reason}")]
    WriteReverted { reason: String },

    /// The session was disconnected or switched while a connect was waiting
    /// on the wallet
    #[error("Connection attempt was superseded by another session change")]
    Superseded,
}

impl SessionError {
    pub(crate) fn connect_failed(err: &WalletError) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            SessionError::AuthorizationRejected("Failed to connect wallet".to_string())
        } else {
            SessionError::AuthorizationRejected(message)
        }
    }

    pub(crate) fn write_failed(err: &ContractError, fallback: &str) -> Self {
        SessionError::WriteReverted {
            reason: err.reason().unwrap_or(fallback).to_string(),
        }
    }
}
