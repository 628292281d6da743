use alloy_primitives::{Address, U256};

/// A tweet as returned by `getAllTweets`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tweet {
    pub id: U256,
    pub author: Address,
    pub content: String,
    /// Unix seconds
    pub timestamp: u64,
    pub likes: U256,
}

/// Order tweets newest first. Ties keep their contract order.
pub fn sort_newest_first(tweets: &mut [Tweet]) {
    tweets.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
