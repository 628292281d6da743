//! Contract layer: the profile and feed aspects of the social contracts

pub mod abi;
mod rpc;

use alloy_primitives::{Address, U256};

use crate::core::{ContractError, TxHandle};
use crate::domain::{ProfileRecord, Tweet};

pub use abi::ContractAbi;
pub use rpc::RpcContracts;

/// Reads and writes against the external contracts.
///
/// Writes return as soon as the transaction is submitted; callers await
/// [`SocialContracts::confirm`] before treating it as durable.
#[async_trait::async_trait]
pub trait SocialContracts: Send + Sync + 'static {
    async fn get_profile(&self, account: Address) -> Result<ProfileRecord, ContractError>;

    async fn set_profile(
        &self,
        from: Address,
        display_name: &str,
        bio: &str,
    ) -> Result<TxHandle, ContractError>;

    /// Tweets authored by `owner`. There is no global feed.
    async fn get_all_tweets(&self, owner: Address) -> Result<Vec<Tweet>, ContractError>;

    async fn create_tweet(&self, from: Address, content: &str) -> Result<TxHandle, ContractError>;

    async fn like_tweet(
        &self,
        from: Address,
        author: Address,
        id: U256,
    ) -> Result<TxHandle, ContractError>;

    async fn get_total_likes(&self, owner: Address) -> Result<U256, ContractError>;

    /// Wait until the write is finalized. A reverted receipt is an error.
    async fn confirm(&self, tx: TxHandle) -> Result<(), ContractError>;
}
