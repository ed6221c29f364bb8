//! The services module defines the traits the client uses to reach the outside world.
mod ledger;
mod wallet;

pub use ledger::VotingLedger;
pub use wallet::WalletProvider;
