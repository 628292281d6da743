//! JSON-RPC wallet provider
//!
//! Talks EIP-1193 methods (`eth_requestAccounts`, `wallet_switchEthereumChain`,
//! ...) to a node or wallet daemon that holds the keys. Change notifications
//! are derived by polling `eth_accounts` and `eth_chainId`.

use std::time::Duration;

use alloy::providers::Provider;
use alloy::transports::TransportError;
use alloy_primitives::Address;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use super::{ChainParams, ProviderEvent, Signer, Subscription, WalletProvider};
use crate::core::WalletError;
use crate::infrastructure::ethereum::NodeProvider;

/// EIP-1193 "the requested account has not been authorized"
const UNAUTHORIZED_CODE: i64 = 4100;

pub struct RpcWallet {
    provider: NodeProvider,
    poll_interval: Duration,
}

impl RpcWallet {
    pub fn new(provider: NodeProvider, poll_interval: Duration) -> Self {
        Self {
            provider,
            poll_interval,
        }
    }
}

#[async_trait::async_trait]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let accounts: Vec<Address> = self
            .provider
            .raw_request("eth_requestAccounts".into(), ())
            .await
            .map_err(|err| wallet_error(err, 0))?;
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        Ok(accounts)
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.provider
            .get_accounts()
            .await
            .map_err(|err| wallet_error(err, 0))
    }

    async fn signing_identity(&self, account: Address) -> Result<Signer, WalletError> {
        let accounts = self.accounts().await?;
        if accounts.contains(&account) {
            Ok(Signer { address: account })
        } else {
            Err(WalletError::Rejected {
                code: UNAUTHORIZED_CODE,
                message: format!("account {account} is not authorized by the wallet"),
            })
        }
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|err| wallet_error(err, 0))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let params = [json!({ "chainId": format!("{:#x}", chain_id) })];
        let _: serde_json::Value = self
            .provider
            .raw_request("wallet_switchEthereumChain".into(), params)
            .await
            .map_err(|err| wallet_error(err, chain_id))?;
        Ok(())
    }

    async fn add_chain(&self, chain: &ChainParams) -> Result<(), WalletError> {
        let _: serde_json::Value = self
            .provider
            .raw_request("wallet_addEthereumChain".into(), [chain.clone()])
            .await
            .map_err(|err| wallet_error(err, chain.id))?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<Subscription, WalletError> {
        let provider = self.provider.clone();
        let mut last_accounts = self.accounts().await?;
        let mut last_chain = self.chain_id().await?;
        let period = self.poll_interval;
        let (tx, rx) = mpsc::channel(16);

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match provider.get_accounts().await {
                    Ok(accounts) if accounts != last_accounts => {
                        last_accounts = accounts.clone();
                        if tx.send(ProviderEvent::AccountsChanged(accounts)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => tracing::debug!("account poll failed: {err}"),
                }

                match provider.get_chain_id().await {
                    Ok(chain) if chain != last_chain => {
                        last_chain = chain;
                        if tx.send(ProviderEvent::ChainChanged(chain)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => tracing::debug!("chain poll failed: {err}"),
                }
            }
        });

        Ok(Subscription::with_task(rx, task))
    }
}

fn wallet_error(err: TransportError, chain_id: u64) -> WalletError {
    match err.as_error_resp() {
        Some(payload) => WalletError::from_response(payload.code, payload.message.to_string(), chain_id),
        None => WalletError::Rpc(err.to_string()),
    }
}
