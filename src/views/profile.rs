use std::fmt;

use alloy_primitives::{Address, U256};

use super::feed::{cards, TweetCard};
use super::{short_address, Panel};
use crate::domain::{Profile, ProfileState};
use crate::infrastructure::contracts::SocialContracts;
use crate::session::SessionState;

pub const NO_BIO: &str = "No bio set.";

/// Public profile page of any address
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub address: Address,
    pub profile: Option<Profile>,
    pub total_likes: U256,
    pub cards: Vec<TweetCard>,
}

impl ProfilePage {
    /// Fetch profile, tweets and like total together. If any read fails
    /// the page renders empty.
    pub async fn load(contracts: &dyn SocialContracts, address: Address) -> Self {
        let fetched = futures::try_join!(
            contracts.get_all_tweets(address),
            contracts.get_profile(address),
            contracts.get_total_likes(address),
        );
        match fetched {
            Ok((tweets, record, total_likes)) => Self {
                address,
                profile: record.decode(),
                total_likes,
                cards: cards(tweets),
            },
            Err(err) => {
                tracing::warn!(%address, "failed to fetch profile page: {err}");
                Self {
                    address,
                    profile: None,
                    total_likes: U256::ZERO,
                    cards: Vec::new(),
                }
            }
        }
    }

    pub fn heading(&self) -> String {
        self.profile
            .as_ref()
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| self.address.to_string())
    }

    pub fn bio(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.bio.as_str())
            .filter(|bio| !bio.is_empty())
            .unwrap_or(NO_BIO)
    }

    pub fn avatar(&self) -> String {
        self.profile
            .as_ref()
            .and_then(|p| p.display_name.chars().next())
            .map(String::from)
            .unwrap_or_else(|| "?".to_string())
    }
}

impl fmt::Display for ProfilePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let panel = Panel::new(format!("[{}] {}", self.avatar(), self.heading()))
            .add("bio", self.bio())
            .add("tweets", self.cards.len().to_string())
            .add("total likes", self.total_likes.to_string());
        writeln!(f, "{panel}")?;
        if self.cards.is_empty() {
            return writeln!(f, "No tweets from this user.");
        }
        for card in &self.cards {
            writeln!(f, "{card}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Connection summary shown in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavStatus {
    pub label: String,
    pub connected: bool,
    /// Connected without a profile: prompt to set one
    pub needs_profile: bool,
}

impl From<&SessionState> for NavStatus {
    fn from(state: &SessionState) -> Self {
        match state.account.filter(|_| state.is_connected()) {
            Some(account) => Self {
                label: state
                    .profile()
                    .map(|p| p.display_name.clone())
                    .unwrap_or_else(|| short_address(&account)),
                connected: true,
                needs_profile: state.profile == ProfileState::Absent,
            },
            None => Self {
                label: if state.is_connecting() {
                    "Connecting...".to_string()
                } else {
                    "Connect Wallet".to_string()
                },
                connected: false,
                needs_profile: false,
            },
        }
    }
}

impl fmt::Display for NavStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.connected {
            return write!(f, "{}", self.label);
        }
        write!(f, "{} (Connected)", self.label)?;
        if self.needs_profile {
            write!(f, " - Set Profile")?;
        }
        Ok(())
    }
}
