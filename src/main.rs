use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use twitter3::config::{self, Config};
use twitter3::core::ActionOutcome;
use twitter3::infrastructure::contracts::{ContractAbi, RpcContracts};
use twitter3::infrastructure::ethereum::{create_provider, NodeProvider, ProviderConfig};
use twitter3::infrastructure::wallet::{RpcWallet, WalletProvider};
use twitter3::session::SessionManager;
use twitter3::store::{SessionStore, SqliteSessionStore};
use twitter3::views::{
    compose_gate, validate_profile, validate_tweet, FeedView, NavStatus, Panel, ProfilePage,
};

#[derive(Debug, Parser)]
#[command(
    name = "twitter3",
    version,
    about = "twitter3: a wallet-backed client for an on-chain social feed"
)]
struct Args {
    /// Wallet HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// Wallet WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long, global = true)]
    ws: Option<String>,

    /// Wallet IPC path. Unix only.
    #[arg(long, global = true)]
    ipc: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the wallet to authorize an account
    Connect,
    /// Forget the session and stop auto-reconnecting
    Disconnect,
    /// Show the current session
    Status,
    /// Your own tweets, newest first
    Feed,
    /// Profile page of an address (defaults to the connected account)
    Profile { address: Option<Address> },
    /// Post a tweet
    Tweet { content: String },
    /// Like someone's tweet
    Like { author: Address, id: U256 },
    /// Register or update your profile
    SetProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        bio: String,
    },
    /// Follow wallet account and network changes
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = config::load();
    let session = build_session(&args, &config).await?;
    session.initialize().await;

    let result = run(&session, args.command).await;
    session.shutdown().await;
    result
}

async fn build_session(args: &Args, config: &Config) -> Result<SessionManager> {
    let wallet_endpoint = wallet_endpoint(args, config)?;
    let wallet_provider = match &wallet_endpoint {
        Some(endpoint) => Some(
            create_provider(endpoint)
                .await
                .with_context(|| format!("connect to wallet at {}", endpoint.display()))?,
        ),
        None => None,
    };

    // Reads work without a wallet, against the network's public endpoint.
    let read_provider = match &wallet_provider {
        Some(provider) => provider.clone(),
        None => public_provider(config).await?,
    };

    let contracts = RpcContracts::new(
        read_provider,
        config.contracts.profile_address()?,
        ContractAbi::load_or(config.contracts.profile_abi.as_deref(), ContractAbi::profile)?,
        config.contracts.twitter_address()?,
        ContractAbi::load_or(config.contracts.twitter_abi.as_deref(), ContractAbi::twitter)?,
    );

    let wallet = wallet_provider.map(|provider| {
        let poll = Duration::from_millis(config.wallet.poll_interval_ms.max(100));
        Arc::new(RpcWallet::new(provider, poll)) as Arc<dyn WalletProvider>
    });

    Ok(SessionManager::new(
        wallet,
        Arc::new(contracts),
        open_store()?,
        config.network.clone(),
        &config.session,
    ))
}

/// CLI flags take precedence over the config file
fn wallet_endpoint(args: &Args, config: &Config) -> Result<Option<ProviderConfig>> {
    if let Some(ipc) = args.ipc.clone() {
        #[cfg(unix)]
        return Ok(Some(ProviderConfig::Ipc(ipc)));
        #[cfg(not(unix))]
        {
            let _ = ipc;
            bail!("IPC is not supported on this platform");
        }
    }
    if let Some(ws) = args.ws.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(Some(ProviderConfig::WebSocket(ws.to_string())));
    }
    if let Some(rpc) = args.rpc.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(Some(ProviderConfig::Http(normalize_http_endpoint(rpc))));
    }
    Ok(ProviderConfig::from_wallet_config(&config.wallet))
}

fn normalize_http_endpoint(value: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("http://{value}")
    }
}

async fn public_provider(config: &Config) -> Result<NodeProvider> {
    let Some(url) = config.network.rpc_urls.first() else {
        bail!("no wallet endpoint and no network.rpc_urls configured");
    };
    create_provider(&ProviderConfig::Http(url.clone())).await
}

/// The on-disk store, or a throwaway one when the data dir is unusable
fn open_store() -> Result<Arc<dyn SessionStore>> {
    let opened = config::session_db_path()
        .context("no data directory")
        .and_then(|path| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            SqliteSessionStore::open(&path)
        });
    let store = match opened {
        Ok(store) => store,
        Err(err) => {
            warn!("session store unavailable, using memory: {err:#}");
            SqliteSessionStore::open_in_memory()?
        }
    };
    Ok(Arc::new(store))
}

async fn run(session: &SessionManager, command: Command) -> Result<()> {
    match command {
        Command::Connect => {
            session.connect().await?;
            print_status(session);
        }
        Command::Disconnect => {
            session.disconnect();
            println!("Disconnected.");
        }
        Command::Status => print_status(session),
        Command::Feed => print!("{}", FeedView::load(session).await),
        Command::Profile { address } => {
            let Some(address) = address.or_else(|| session.account()) else {
                bail!("Please connect your wallet first");
            };
            print!("{}", ProfilePage::load(session.contracts().as_ref(), address).await);
        }
        Command::Tweet { content } => {
            compose_gate(&session.snapshot())?;
            let content = validate_tweet(&content)?;
            let outcome = session
                .create_tweet(content, move || async move {
                    print!("{}", FeedView::load(session).await);
                })
                .await;
            report(outcome, "Tweet posted.")?;
        }
        Command::Like { author, id } => {
            let outcome = session
                .like_tweet(author, id, move || async move {
                    print!("{}", ProfilePage::load(session.contracts().as_ref(), author).await);
                })
                .await;
            report(outcome, "Liked.")?;
        }
        Command::SetProfile { name, bio } => {
            let (name, bio) = validate_profile(&name, &bio)?;
            let outcome = session.set_profile(name, bio, || async {}).await;
            report(outcome, "Profile saved.")?;
            print_status(session);
        }
        Command::Watch => {
            print_status(session);
            if !session.has_wallet() {
                bail!("no wallet endpoint configured");
            }
            loop {
                tokio::select! {
                    event = session.next_event() => match event {
                        Some(event) => {
                            session.handle_event(event).await;
                            print_status(session);
                        }
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }
    Ok(())
}

fn report(outcome: ActionOutcome, success: &str) -> Result<()> {
    match outcome {
        ActionOutcome::Confirmed(tx) => {
            println!("{success} ({})", tx.hash);
            Ok(())
        }
        ActionOutcome::Skipped => bail!("Please connect your wallet first"),
        ActionOutcome::Failed(message) => bail!(message),
        ActionOutcome::Detached => {
            println!("Transaction confirmed after the session changed.");
            Ok(())
        }
    }
}

fn print_status(session: &SessionManager) {
    let state = session.snapshot();
    let mut panel = Panel::new(NavStatus::from(&state).to_string());
    if let Some(account) = state.account {
        panel = panel.add("account", account.to_string());
    }
    if let Some(chain_id) = state.chain_id {
        panel = panel.add("chain", chain_id.to_string());
    }
    if let Some(error) = &state.error {
        panel = panel.add("error", error.clone());
    }
    print!("{panel}");
}
