//! Ethereum infrastructure - Alloy provider construction

mod provider;

pub use provider::{create_provider, NodeProvider, ProviderConfig};
