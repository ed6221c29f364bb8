//! This crate defines the core traits and types shared by every part of the VoteChain client.
//! It specifies the interfaces which allow the same page logic to run against the deployed
//! voting contract, a local development chain, or the in-memory mocks used in tests.

#![deny(missing_docs)]

mod services;
mod types;

#[cfg(feature = "mocks")]
pub mod mocks;

pub use ethereum_types;
pub use services::*;
pub use types::*;
