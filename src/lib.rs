//! twitter3: wallet session management for an on-chain social feed

pub mod config;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod session;
pub mod store;
pub mod views;
