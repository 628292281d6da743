use thiserror::Error;

use crate::domain::ProfileState;
use crate::session::SessionState;

pub const MAX_TWEET_CHARS: usize = 280;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("Please connect your wallet first")]
    NotConnected,

    #[error("Identity Required: set up your on-chain profile before you can post tweets.")]
    IdentityRequired,

    #[error("Tweet is empty")]
    EmptyTweet,

    #[error("Tweet is {0} characters; the limit is {max}", max = MAX_TWEET_CHARS)]
    TweetTooLong(usize),

    #[error("Display name and bio are both required")]
    IncompleteProfile,
}

/// Whether the session may post. Posting needs a connected account with a
/// registered profile.
pub fn compose_gate(state: &SessionState) -> Result<(), ComposeError> {
    if !state.is_connected() {
        return Err(ComposeError::NotConnected);
    }
    match state.profile {
        ProfileState::Present(_) => Ok(()),
        _ => Err(ComposeError::IdentityRequired),
    }
}

pub fn validate_tweet(content: &str) -> Result<&str, ComposeError> {
    if content.trim().is_empty() {
        return Err(ComposeError::EmptyTweet);
    }
    let len = content.chars().count();
    if len > MAX_TWEET_CHARS {
        return Err(ComposeError::TweetTooLong(len));
    }
    Ok(content)
}

pub fn validate_profile<'a>(
    display_name: &'a str,
    bio: &'a str,
) -> Result<(&'a str, &'a str), ComposeError> {
    if display_name.is_empty() || bio.is_empty() {
        return Err(ComposeError::IncompleteProfile);
    }
    Ok((display_name, bio))
}
