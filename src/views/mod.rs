//! View models
//!
//! Plain projections of session and contract data, rendered by the binary.
//! Nothing here talks to the wallet; reads go through the contract layer and
//! writes through the session manager.

mod compose;
mod feed;
mod profile;

use std::fmt;

use alloy_primitives::Address;
use chrono::DateTime;

pub use compose::{compose_gate, validate_profile, validate_tweet, ComposeError, MAX_TWEET_CHARS};
pub use feed::{FeedView, TweetCard};
pub use profile::{NavStatus, ProfilePage};

/// `0x1234...abcd`
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Calendar date of a unix timestamp, UTC
pub fn format_date(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}

/// Titled block of label/value rows
#[derive(Debug, Clone, Default)]
pub struct Panel {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl Panel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn add(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push((label.into(), value.into()));
        self
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        let width = self.rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in &self.rows {
            writeln!(f, "  {label:<width$}  {value}")?;
        }
        Ok(())
    }
}
