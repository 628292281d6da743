//! Wallet provider capability
//!
//! The session manager never talks to a wallet directly; it goes through
//! [`WalletProvider`], so tests can swap in a fake and the binary can plug
//! in the JSON-RPC implementation.

mod rpc;

use alloy_primitives::Address;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::NetworkConfig;
use crate::core::WalletError;

pub use rpc::RpcWallet;

/// Notifications pushed by the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The set of authorized accounts changed; empty means logged out
    AccountsChanged(Vec<Address>),
    /// The wallet switched networks
    ChainChanged(u64),
}

/// Identity able to sign writes for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signer {
    pub address: Address,
}

/// EIP-3085 `wallet_addEthereumChain` parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    #[serde(skip)]
    pub id: u64,
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl From<&NetworkConfig> for ChainParams {
    fn from(network: &NetworkConfig) -> Self {
        Self {
            id: network.chain_id,
            chain_id: format!("{:#x}", network.chain_id),
            chain_name: network.chain_name.clone(),
            native_currency: NativeCurrency {
                name: network.currency_name.clone(),
                symbol: network.currency_symbol.clone(),
                decimals: network.currency_decimals,
            },
            rpc_urls: network.rpc_urls.clone(),
            block_explorer_urls: network.explorer_urls.clone(),
        }
    }
}

/// Registered listener for wallet notifications.
///
/// Dropping the subscription deregisters the listener.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<ProviderEvent>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Subscription whose sender is owned by the caller
    pub fn new(events: mpsc::Receiver<ProviderEvent>) -> Self {
        Self { events, task: None }
    }

    /// Subscription fed by a background task, aborted on drop
    pub fn with_task(events: mpsc::Receiver<ProviderEvent>, task: JoinHandle<()>) -> Self {
        Self {
            events,
            task: Some(task),
        }
    }

    /// Wait for the next notification. `None` once the wallet side closed.
    pub async fn recv(&mut self) -> Option<ProviderEvent> {
        self.events.recv().await
    }

    /// Take a pending notification without waiting
    pub fn try_recv(&mut self) -> Option<ProviderEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Injectable wallet capability
#[async_trait::async_trait]
pub trait WalletProvider: Send + Sync + 'static {
    /// Ask the wallet to authorize accounts. May prompt the user.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Accounts already authorized. Never prompts.
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Acquire the identity that signs writes for `account`
    async fn signing_identity(&self, account: Address) -> Result<Signer, WalletError>;

    /// Network the wallet is currently on
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// Ask the wallet to switch networks
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    /// Ask the wallet to add an unknown network
    async fn add_chain(&self, chain: &ChainParams) -> Result<(), WalletError>;

    /// Register for account and network notifications
    async fn subscribe(&self) -> Result<Subscription, WalletError>;
}
