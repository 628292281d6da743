//! Contract ABIs and the conversions between ABI values and domain records

use std::fs;
use std::path::Path;

use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::U256;
use anyhow::{Context, Result};

use crate::core::ContractError;
use crate::domain::{ProfileRecord, Tweet};

pub const PROFILE_SIGNATURES: &[&str] = &[
    "function getProfile(address _user) view returns (string displayName, string bio)",
    "function setProfile(string _displayName, string _bio)",
];

pub const TWITTER_SIGNATURES: &[&str] = &[
    // Tweet fields, in order: id, author, content, timestamp, likes
    "function getAllTweets(address _owner) view returns ((uint256,address,string,uint256,uint256)[])",
    "function createTweet(string _tweet)",
    "function likeTweet(address author, uint256 id)",
    "function getTotalLikes(address _author) view returns (uint256)",
];

/// ABI of one deployed contract
#[derive(Debug, Clone)]
pub struct ContractAbi {
    abi: JsonAbi,
}

impl ContractAbi {
    pub fn profile() -> Result<Self> {
        Self::parse(PROFILE_SIGNATURES)
    }

    pub fn twitter() -> Result<Self> {
        Self::parse(TWITTER_SIGNATURES)
    }

    /// Build from human-readable signatures
    pub fn parse(signatures: &[&str]) -> Result<Self> {
        let abi = JsonAbi::parse(signatures.iter().copied()).context("parse ABI signatures")?;
        Ok(Self { abi })
    }

    /// Load a compiler artifact: either a raw ABI array or an object with
    /// an `abi` field.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("load ABI {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let abi_value = if value.is_array() {
            value
        } else if let Some(abi) = value.get("abi") {
            abi.clone()
        } else {
            anyhow::bail!("no ABI found");
        };
        let abi: JsonAbi = serde_json::from_value(abi_value)?;
        Ok(Self { abi })
    }

    /// Load from `path` when configured, else use the built-in signatures
    pub fn load_or(path: Option<&str>, fallback: fn() -> Result<Self>) -> Result<Self> {
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(path) => Self::load(Path::new(path)),
            None => fallback(),
        }
    }

    pub fn function(&self, name: &str) -> Result<&Function, ContractError> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| ContractError::Decode(format!("ABI has no function {name}")))
    }
}

/// Convert `getProfile` outputs into a record. Outputs are either two
/// strings or a single struct wrapping them.
pub fn profile_record(
    function: &Function,
    values: &[DynSolValue],
) -> Result<ProfileRecord, ContractError> {
    let (names, values): (Vec<String>, &[DynSolValue]) = match values {
        [DynSolValue::Tuple(fields)] => {
            let names = function
                .outputs
                .first()
                .map(|param| param.components.iter().map(|c| c.name.clone()).collect())
                .unwrap_or_default();
            (names, fields.as_slice())
        }
        _ => (
            function.outputs.iter().map(|param| param.name.clone()).collect(),
            values,
        ),
    };

    let strings = values
        .iter()
        .map(|value| {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| ContractError::Decode(format!("profile field {value:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProfileRecord::from_parts(&names, strings))
}

/// Convert `getAllTweets` output into tweets
pub fn tweets(values: Vec<DynSolValue>) -> Result<Vec<Tweet>, ContractError> {
    let Some(DynSolValue::Array(items)) = values.into_iter().next() else {
        return Err(ContractError::Decode("tweet list".into()));
    };
    items.iter().map(tweet).collect()
}

fn tweet(value: &DynSolValue) -> Result<Tweet, ContractError> {
    let DynSolValue::Tuple(fields) = value else {
        return Err(ContractError::Decode(format!("tweet {value:?}")));
    };
    let [id, author, content, timestamp, likes] = fields.as_slice() else {
        return Err(ContractError::Decode(format!("tweet with {} fields", fields.len())));
    };

    Ok(Tweet {
        id: uint(id, "tweet id")?,
        author: author
            .as_address()
            .ok_or_else(|| ContractError::Decode("tweet author".into()))?,
        content: content
            .as_str()
            .ok_or_else(|| ContractError::Decode("tweet content".into()))?
            .to_string(),
        timestamp: uint(timestamp, "tweet timestamp")?.saturating_to::<u64>(),
        likes: uint(likes, "tweet likes")?,
    })
}

/// First output as an unsigned integer
pub fn first_uint(values: &[DynSolValue], what: &str) -> Result<U256, ContractError> {
    values
        .first()
        .ok_or_else(|| ContractError::Decode(what.to_string()))
        .and_then(|value| uint(value, what))
}

fn uint(value: &DynSolValue, what: &str) -> Result<U256, ContractError> {
    value
        .as_uint()
        .map(|(value, _)| value)
        .ok_or_else(|| ContractError::Decode(what.to_string()))
}
