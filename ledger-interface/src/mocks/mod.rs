//! Defines mock instantiations of the service traits, which are useful
//! for testing the client without a chain.

mod ledger;
mod wallet;

pub use ledger::{MockLedger, MockLedgerError};
pub use wallet::{MockWalletError, MockWalletProvider};
