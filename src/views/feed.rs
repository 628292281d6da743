use std::fmt;

use alloy_primitives::{Address, U256};

use super::{format_date, short_address};
use crate::domain::{sort_newest_first, Tweet};
use crate::session::SessionManager;

pub const EMPTY_FEED: &str = "No tweets yet. Be the first to post!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetCard {
    pub id: U256,
    pub author: Address,
    pub author_short: String,
    pub date: String,
    pub content: String,
    pub likes: U256,
}

impl From<&Tweet> for TweetCard {
    fn from(tweet: &Tweet) -> Self {
        Self {
            id: tweet.id,
            author: tweet.author,
            author_short: short_address(&tweet.author),
            date: format_date(tweet.timestamp),
            content: tweet.content.clone(),
            likes: tweet.likes,
        }
    }
}

impl fmt::Display for TweetCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#{} {}  {}", self.id, self.author_short, self.date)?;
        writeln!(f, "  {}", self.content)?;
        write!(f, "  ♥ {}", self.likes)
    }
}

/// Cards newest first
pub fn cards(mut tweets: Vec<Tweet>) -> Vec<TweetCard> {
    sort_newest_first(&mut tweets);
    tweets.iter().map(TweetCard::from).collect()
}

/// Home feed: the connected account's own tweets
#[derive(Debug, Clone, Default)]
pub struct FeedView {
    pub account: Option<Address>,
    pub cards: Vec<TweetCard>,
}

impl FeedView {
    /// Empty when disconnected. Read failures are logged and render as an
    /// empty feed.
    pub async fn load(session: &SessionManager) -> Self {
        let Some(account) = session.account() else {
            return Self::default();
        };
        let tweets = match session.contracts().get_all_tweets(account).await {
            Ok(tweets) => tweets,
            Err(err) => {
                tracing::warn!(%account, "failed to fetch tweets: {err}");
                Vec::new()
            }
        };
        Self {
            account: Some(account),
            cards: cards(tweets),
        }
    }
}

impl fmt::Display for FeedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cards.is_empty() {
            return writeln!(f, "{EMPTY_FEED}");
        }
        for card in &self.cards {
            writeln!(f, "{card}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}
