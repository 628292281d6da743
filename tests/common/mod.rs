//! In-memory wallet and contracts for session tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use tokio::sync::{mpsc, Semaphore};

use twitter3::config::{NetworkConfig, SessionConfig, DEFAULT_CHAIN_ID};
use twitter3::core::{ContractError, TxHandle, WalletError};
use twitter3::domain::{ProfileRecord, Tweet};
use twitter3::infrastructure::contracts::SocialContracts;
use twitter3::infrastructure::wallet::{
    ChainParams, ProviderEvent, Signer, Subscription, WalletProvider,
};
use twitter3::session::SessionManager;
use twitter3::store::{SessionStore, SqliteSessionStore};

pub const ALICE: Address = Address::repeat_byte(0xaa);
pub const BOB: Address = Address::repeat_byte(0xbb);

pub struct FakeWallet {
    authorized: Mutex<Vec<Address>>,
    grant: Mutex<Result<Vec<Address>, WalletError>>,
    chain: Mutex<u64>,
    known_chains: Mutex<Vec<u64>>,
    switch_error: Mutex<Option<WalletError>>,
    sender: Mutex<Option<mpsc::Sender<ProviderEvent>>>,
    request_gate: Option<Semaphore>,
    pub subscribes: AtomicUsize,
    pub prompts: AtomicUsize,
    pub switches: AtomicUsize,
    pub added: Mutex<Vec<ChainParams>>,
}

impl FakeWallet {
    /// Wallet that will grant `accounts` when asked, already on the target
    /// network.
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            authorized: Mutex::new(Vec::new()),
            grant: Mutex::new(Ok(accounts)),
            chain: Mutex::new(DEFAULT_CHAIN_ID),
            known_chains: Mutex::new(vec![1, DEFAULT_CHAIN_ID]),
            switch_error: Mutex::new(None),
            sender: Mutex::new(None),
            request_gate: None,
            subscribes: AtomicUsize::new(0),
            prompts: AtomicUsize::new(0),
            switches: AtomicUsize::new(0),
            added: Mutex::new(Vec::new()),
        }
    }

    /// Accounts authorized in an earlier visit
    pub fn authorized(self, accounts: Vec<Address>) -> Self {
        self.set_authorized(accounts);
        self
    }

    pub fn set_authorized(&self, accounts: Vec<Address>) {
        *self.authorized.lock().unwrap() = accounts;
    }

    pub fn rejecting(self, code: i64, message: &str) -> Self {
        *self.grant.lock().unwrap() = Err(WalletError::Rejected {
            code,
            message: message.to_string(),
        });
        self
    }

    /// Hold authorization requests until `release_requests`
    pub fn holding_requests(mut self) -> Self {
        self.request_gate = Some(Semaphore::new(0));
        self
    }

    pub fn release_requests(&self, n: usize) {
        if let Some(gate) = &self.request_gate {
            gate.add_permits(n);
        }
    }

    pub fn on_chain(self, chain_id: u64) -> Self {
        *self.chain.lock().unwrap() = chain_id;
        self
    }

    pub fn without_chain(self, chain_id: u64) -> Self {
        self.known_chains.lock().unwrap().retain(|id| *id != chain_id);
        self
    }

    pub fn failing_switch(self, err: WalletError) -> Self {
        *self.switch_error.lock().unwrap() = Some(err);
        self
    }

    pub fn current_chain(&self) -> u64 {
        *self.chain.lock().unwrap()
    }

    /// Push a notification to the registered listener
    pub fn emit(&self, event: ProviderEvent) {
        if let ProviderEvent::AccountsChanged(accounts) = &event {
            *self.authorized.lock().unwrap() = accounts.clone();
        }
        if let ProviderEvent::ChainChanged(chain_id) = &event {
            *self.chain.lock().unwrap() = *chain_id;
        }
        let sender = self.sender.lock().unwrap();
        sender
            .as_ref()
            .expect("no listener registered")
            .try_send(event)
            .expect("listener queue full or closed");
    }
}

#[async_trait::async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.request_gate {
            gate.acquire().await.unwrap().forget();
        }
        let granted = self.grant.lock().unwrap().clone()?;
        *self.authorized.lock().unwrap() = granted.clone();
        Ok(granted)
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.authorized.lock().unwrap().clone())
    }

    async fn signing_identity(&self, account: Address) -> Result<Signer, WalletError> {
        Ok(Signer { address: account })
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.current_chain())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        self.switches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.switch_error.lock().unwrap().clone() {
            return Err(err);
        }
        if !self.known_chains.lock().unwrap().contains(&chain_id) {
            return Err(WalletError::UnrecognizedChain(chain_id));
        }
        *self.chain.lock().unwrap() = chain_id;
        Ok(())
    }

    async fn add_chain(&self, chain: &ChainParams) -> Result<(), WalletError> {
        self.added.lock().unwrap().push(chain.clone());
        self.known_chains.lock().unwrap().push(chain.id);
        *self.chain.lock().unwrap() = chain.id;
        Ok(())
    }

    async fn subscribe(&self) -> Result<Subscription, WalletError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        *self.sender.lock().unwrap() = Some(tx);
        Ok(Subscription::new(rx))
    }
}

pub struct FakeContracts {
    profiles: Mutex<HashMap<Address, ProfileRecord>>,
    tweets: Mutex<Vec<Tweet>>,
    write_error: Mutex<Option<ContractError>>,
    fail_reads: AtomicBool,
    gated: AtomicBool,
    gate: Semaphore,
    tx_count: AtomicUsize,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub writers: Mutex<Vec<Address>>,
    pub confirmed: AtomicUsize,
    pub confirms_started: AtomicUsize,
}

impl FakeContracts {
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            tweets: Mutex::new(Vec::new()),
            write_error: Mutex::new(None),
            fail_reads: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            tx_count: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            writers: Mutex::new(Vec::new()),
            confirmed: AtomicUsize::new(0),
            confirms_started: AtomicUsize::new(0),
        }
    }

    pub fn with_profile(self, account: Address, record: ProfileRecord) -> Self {
        self.profiles.lock().unwrap().insert(account, record);
        self
    }

    pub fn with_tweet(self, author: Address, content: &str, timestamp: u64) -> Self {
        {
            let mut tweets = self.tweets.lock().unwrap();
            let id = U256::from(tweets.len());
            tweets.push(Tweet {
                id,
                author,
                content: content.to_string(),
                timestamp,
                likes: U256::ZERO,
            });
        }
        self
    }

    pub fn failing_writes(self, err: ContractError) -> Self {
        *self.write_error.lock().unwrap() = Some(err);
        self
    }

    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    /// Hold every confirmation until [`FakeContracts::release`]
    pub fn gated(self) -> Self {
        self.gated.store(true, Ordering::SeqCst);
        self
    }

    pub fn release(&self, confirmations: usize) {
        self.gate.add_permits(confirmations);
    }

    pub fn tweet_count(&self) -> usize {
        self.tweets.lock().unwrap().len()
    }

    fn read(&self) -> Result<(), ContractError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ContractError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn submit(&self, from: Address) -> Result<TxHandle, ContractError> {
        if let Some(err) = self.write_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.writers.lock().unwrap().push(from);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        let n = self.tx_count.fetch_add(1, Ordering::SeqCst) as u8 + 1;
        Ok(TxHandle::new(B256::with_last_byte(n)))
    }

    fn registered(&self, account: Address) -> bool {
        self.profiles
            .lock()
            .unwrap()
            .get(&account)
            .and_then(ProfileRecord::decode)
            .is_some()
    }
}

#[async_trait::async_trait]
impl SocialContracts for FakeContracts {
    async fn get_profile(&self, account: Address) -> Result<ProfileRecord, ContractError> {
        self.read()?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .get(&account)
            .cloned()
            .unwrap_or_else(|| ProfileRecord::named("", "")))
    }

    async fn set_profile(
        &self,
        from: Address,
        display_name: &str,
        bio: &str,
    ) -> Result<TxHandle, ContractError> {
        let tx = self.submit(from)?;
        self.profiles
            .lock()
            .unwrap()
            .insert(from, ProfileRecord::named(display_name, bio));
        Ok(tx)
    }

    async fn get_all_tweets(&self, owner: Address) -> Result<Vec<Tweet>, ContractError> {
        self.read()?;
        Ok(self
            .tweets
            .lock()
            .unwrap()
            .iter()
            .filter(|tweet| tweet.author == owner)
            .cloned()
            .collect())
    }

    async fn create_tweet(&self, from: Address, content: &str) -> Result<TxHandle, ContractError> {
        if !self.registered(from) && self.write_error.lock().unwrap().is_none() {
            return Err(ContractError::reverted("Unregistered"));
        }
        let tx = self.submit(from)?;
        let mut tweets = self.tweets.lock().unwrap();
        let id = U256::from(tweets.len());
        let timestamp = 1_700_000_000 + tweets.len() as u64;
        tweets.push(Tweet {
            id,
            author: from,
            content: content.to_string(),
            timestamp,
            likes: U256::ZERO,
        });
        Ok(tx)
    }

    async fn like_tweet(
        &self,
        from: Address,
        author: Address,
        id: U256,
    ) -> Result<TxHandle, ContractError> {
        let tx = self.submit(from)?;
        let mut tweets = self.tweets.lock().unwrap();
        if let Some(tweet) = tweets.iter_mut().find(|t| t.author == author && t.id == id) {
            tweet.likes += U256::from(1u8);
        }
        Ok(tx)
    }

    async fn get_total_likes(&self, owner: Address) -> Result<U256, ContractError> {
        self.read()?;
        Ok(self
            .tweets
            .lock()
            .unwrap()
            .iter()
            .filter(|tweet| tweet.author == owner)
            .map(|tweet| tweet.likes)
            .sum())
    }

    async fn confirm(&self, _tx: TxHandle) -> Result<(), ContractError> {
        self.confirms_started.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            self.gate
                .acquire()
                .await
                .map_err(|err| ContractError::Transport(err.to_string()))?
                .forget();
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.confirmed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn memory_store() -> Arc<SqliteSessionStore> {
    Arc::new(SqliteSessionStore::open_in_memory().unwrap())
}

pub fn manager(
    wallet: Option<Arc<FakeWallet>>,
    contracts: Arc<FakeContracts>,
    store: Arc<dyn SessionStore>,
) -> SessionManager {
    manager_with(wallet, contracts, store, SessionConfig::default())
}

pub fn manager_with(
    wallet: Option<Arc<FakeWallet>>,
    contracts: Arc<FakeContracts>,
    store: Arc<dyn SessionStore>,
    session: SessionConfig,
) -> SessionManager {
    SessionManager::new(
        wallet.map(|w| w as Arc<dyn WalletProvider>),
        contracts,
        store,
        NetworkConfig::default(),
        &session,
    )
}

/// Poll `cond` while letting spawned tasks run
pub async fn until(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}
