//! Alloy implementation of the contract layer
//!
//! Calls are encoded with alloy-dyn-abi against the configured ABIs. Reads go
//! through `eth_call`; writes go through `eth_sendTransaction` with `from`
//! set, so the wallet behind the endpoint signs them.

use alloy::providers::{PendingTransactionBuilder, Provider};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::transports::TransportError;
use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::Function;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{Revert, SolError};

use super::abi::{self, ContractAbi};
use super::SocialContracts;
use crate::core::{ContractError, TxHandle};
use crate::domain::{ProfileRecord, Tweet};
use crate::infrastructure::ethereum::NodeProvider;

const EXECUTION_REVERTED: &str = "execution reverted";

pub struct RpcContracts {
    provider: NodeProvider,
    profile_address: Address,
    profile_abi: ContractAbi,
    twitter_address: Address,
    twitter_abi: ContractAbi,
}

impl RpcContracts {
    pub fn new(
        provider: NodeProvider,
        profile_address: Address,
        profile_abi: ContractAbi,
        twitter_address: Address,
        twitter_abi: ContractAbi,
    ) -> Self {
        Self {
            provider,
            profile_address,
            profile_abi,
            twitter_address,
            twitter_abi,
        }
    }

    async fn read(
        &self,
        to: Address,
        function: &Function,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, ContractError> {
        let data = function
            .abi_encode_input(args)
            .map_err(|err| ContractError::Decode(format!("{} arguments: {err}", function.name)))?;
        let request = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(Bytes::from(data)));

        let output = self.provider.call(request).await.map_err(contract_error)?;
        function
            .abi_decode_output(&output)
            .map_err(|err| ContractError::Decode(format!("{} output: {err}", function.name)))
    }

    async fn write(
        &self,
        from: Address,
        to: Address,
        function: &Function,
        args: &[DynSolValue],
    ) -> Result<TxHandle, ContractError> {
        let data = function
            .abi_encode_input(args)
            .map_err(|err| ContractError::Decode(format!("{} arguments: {err}", function.name)))?;
        let request = TransactionRequest::default()
            .from(from)
            .to(to)
            .input(TransactionInput::new(Bytes::from(data)));

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(contract_error)?;
        let hash = *pending.tx_hash();
        tracing::debug!(%hash, method = %function.name, "transaction submitted");
        Ok(TxHandle::new(hash))
    }
}

#[async_trait::async_trait]
impl SocialContracts for RpcContracts {
    async fn get_profile(&self, account: Address) -> Result<ProfileRecord, ContractError> {
        let function = self.profile_abi.function("getProfile")?;
        let values = self
            .read(self.profile_address, function, &[DynSolValue::Address(account)])
            .await?;
        abi::profile_record(function, &values)
    }

    async fn set_profile(
        &self,
        from: Address,
        display_name: &str,
        bio: &str,
    ) -> Result<TxHandle, ContractError> {
        let function = self.profile_abi.function("setProfile")?;
        let args = [
            DynSolValue::String(display_name.to_string()),
            DynSolValue::String(bio.to_string()),
        ];
        self.write(from, self.profile_address, function, &args).await
    }

    async fn get_all_tweets(&self, owner: Address) -> Result<Vec<Tweet>, ContractError> {
        let function = self.twitter_abi.function("getAllTweets")?;
        let values = self
            .read(self.twitter_address, function, &[DynSolValue::Address(owner)])
            .await?;
        abi::tweets(values)
    }

    async fn create_tweet(&self, from: Address, content: &str) -> Result<TxHandle, ContractError> {
        let function = self.twitter_abi.function("createTweet")?;
        let args = [DynSolValue::String(content.to_string())];
        self.write(from, self.twitter_address, function, &args).await
    }

    async fn like_tweet(
        &self,
        from: Address,
        author: Address,
        id: U256,
    ) -> Result<TxHandle, ContractError> {
        let function = self.twitter_abi.function("likeTweet")?;
        let args = [DynSolValue::Address(author), DynSolValue::Uint(id, 256)];
        self.write(from, self.twitter_address, function, &args).await
    }

    async fn get_total_likes(&self, owner: Address) -> Result<U256, ContractError> {
        let function = self.twitter_abi.function("getTotalLikes")?;
        let values = self
            .read(self.twitter_address, function, &[DynSolValue::Address(owner)])
            .await?;
        abi::first_uint(&values, "total likes")
    }

    async fn confirm(&self, tx: TxHandle) -> Result<(), ContractError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx.hash)
            .get_receipt()
            .await
            .map_err(|err| ContractError::Transport(err.to_string()))?;
        if receipt.status() {
            Ok(())
        } else {
            Err(ContractError::Reverted { reason: None })
        }
    }
}

fn contract_error(err: TransportError) -> ContractError {
    let Some(payload) = err.as_error_resp() else {
        return ContractError::Transport(err.to_string());
    };

    if let Some(data) = payload.as_revert_data() {
        return ContractError::Reverted {
            reason: revert_reason(&data),
        };
    }
    if payload.message.starts_with(EXECUTION_REVERTED) {
        return ContractError::Reverted {
            reason: reason_from_message(&payload.message),
        };
    }
    ContractError::Transport(payload.message.to_string())
}

/// Decode `Error(string)` revert data
fn revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data).ok().map(|revert| revert.reason)
}

/// "execution reverted: Unregistered" -> "Unregistered"
fn reason_from_message(message: &str) -> Option<String> {
    message
        .strip_prefix(EXECUTION_REVERTED)
        .map(|rest| rest.trim_start_matches(':').trim())
        .filter(|reason| !reason.is_empty())
        .map(str::to_string)
}
