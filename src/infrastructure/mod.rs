//! Infrastructure layer
//!
//! Everything that talks to the outside world: the node connection, the
//! wallet provider, and the social contracts.

pub mod contracts;
pub mod ethereum;
pub mod wallet;
