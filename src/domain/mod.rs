//! Domain models for the social contracts
//!
//! These types are independent of the transport that produced them:
//! the contract layer converts ABI values into them, the session manager
//! and the views consume them.

mod profile;
mod tweet;

pub use profile::{Profile, ProfileRecord, ProfileState};
pub use tweet::{sort_newest_first, Tweet};
