//! Node connection shared by the wallet provider and the contract layer

use std::path::PathBuf;

use alloy::network::Ethereum;
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, ProviderBuilder, RootProvider,
};
use anyhow::{Context, Result};

use crate::config::WalletConfig;

/// Provider with the recommended fillers. Transactions are sent unsigned
/// with `from` set; the wallet behind the endpoint signs them.
pub type NodeProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Pick the wallet endpoint from config. `None` means no wallet is
    /// available to this client.
    pub fn from_wallet_config(config: &WalletConfig) -> Option<Self> {
        #[cfg(unix)]
        if let Some(path) = config.ipc.as_deref().filter(|p| !p.trim().is_empty()) {
            return Some(ProviderConfig::Ipc(PathBuf::from(path)));
        }
        if let Some(url) = config.ws.as_deref().filter(|u| !u.trim().is_empty()) {
            return Some(ProviderConfig::WebSocket(url.to_string()));
        }
        config
            .rpc
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .map(|url| ProviderConfig::Http(url.to_string()))
    }

    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }
}

/// Create a provider from configuration
pub async fn create_provider(config: &ProviderConfig) -> Result<NodeProvider> {
    match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            Ok(ProviderBuilder::new().connect_http(rpc_url))
        }
        ProviderConfig::WebSocket(url) => ProviderBuilder::new()
            .connect(url)
            .await
            .context("Failed to create WebSocket provider"),
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc = IpcConnect::new(path.to_string_lossy().to_string());
            ProviderBuilder::new()
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")
        }
    }
}
