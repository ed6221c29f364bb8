//! Binds the VoteChain client to a voting contract deployed on an EVM chain.
//!
//! [`EvmWalletProvider`] plays the part of the browser wallet: it knows the chain, holds
//! the signing keys and hands out [`EvmLedger`] handles to the contract.

mod contract;
mod error;
mod ledger;
mod wallet;

pub use contract::VotingContract;
pub use error::EvmError;
pub use ledger::EvmLedger;
pub use wallet::{wallet_from_hex, EvmConfig, EvmWalletProvider};
