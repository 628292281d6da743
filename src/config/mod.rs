use std::fs;
use std::path::PathBuf;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Sepolia, the network the social contracts are deployed on
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub contracts: ContractsConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Where the wallet provider lives. At most one endpoint is used,
/// in the order ipc, ws, rpc.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<String>,
    /// How often account/chain changes are polled
    pub poll_interval_ms: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc: None,
            ws: None,
            ipc: None,
            poll_interval_ms: 1_000,
        }
    }
}

/// The network the session must be on, plus what the wallet needs
/// to add it when it is unknown.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub explorer_urls: Vec<String>,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            chain_name: "Sepolia Test Network".to_string(),
            rpc_urls: vec!["https://rpc.sepolia.org".to_string()],
            explorer_urls: vec!["https://sepolia.etherscan.io".to_string()],
            currency_name: "Sepolia Ether".to_string(),
            currency_symbol: "SEP".to_string(),
            currency_decimals: 18,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractsConfig {
    pub profile: Option<String>,
    pub twitter: Option<String>,
    /// Optional ABI JSON artifacts; built-in signatures are used otherwise
    pub profile_abi: Option<String>,
    pub twitter_abi: Option<String>,
}

impl ContractsConfig {
    pub fn profile_address(&self) -> Result<Address> {
        parse_address("contracts.profile", self.profile.as_deref())
    }

    pub fn twitter_address(&self) -> Result<Address> {
        parse_address("contracts.twitter", self.twitter.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Issue writes one at a time instead of letting them overlap
    #[serde(default)]
    pub serialize_writes: bool,
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    parse(&content).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), "ignoring invalid config: {err:#}");
        Config::default()
    })
}

pub fn parse(content: &str) -> Result<Config> {
    toml::from_str::<Config>(content).context("parse config")
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("TWITTER3_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("twitter3").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("twitter3").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "twitter3", "twitter3")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("twitter3"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("twitter3"));
    }
    directories::ProjectDirs::from("io", "twitter3", "twitter3")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn session_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("session.sqlite3"))
}

fn parse_address(key: &str, value: Option<&str>) -> Result<Address> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .with_context(|| format!("{key} is not configured"))?;
    value
        .parse::<Address>()
        .with_context(|| format!("{key}: invalid address {value}"))
}
