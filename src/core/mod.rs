pub mod action;
pub mod error;

pub use action::{ActionKind, ActionOutcome, TxHandle};
pub use error::{ContractError, SessionError, WalletError};
