//! Wallet session manager
//!
//! The single context object every view goes through: connection state,
//! the active account, its cached profile, and dispatch of writes to the
//! contract layer.

mod dispatch;
mod manager;
mod state;

pub use manager::SessionManager;
pub use state::{ConnectionStatus, SessionState};
