//! The wallet module defines how the client discovers accounts and networks.
use std::fmt::{self, Display};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{Address, ProviderEvent, VotingLedger};

/// A `WalletProvider` holds the user's accounts and the connection to a network.
///
/// It answers which chain it is connected to and which accounts the user authorized,
/// notifies subscribers when either changes, and hands out ledger handles that sign
/// with those accounts.
#[async_trait]
pub trait WalletProvider: Send + Sync + 'static {
    /// The ledger handle produced by [`WalletProvider::ledger_at`].
    type Ledger: VotingLedger;

    /// The error type for fallible methods.
    type Error: fmt::Debug + Display + Send + Sync + 'static;

    /// The id of the chain the provider is currently connected to.
    async fn chain_id(&self) -> Result<u64, Self::Error>;

    /// The accounts the user already authorized, active account first.
    /// Never prompts the user.
    async fn accounts(&self) -> Result<Vec<Address>, Self::Error>;

    /// Asks the user to authorize accounts and returns the authorized set.
    async fn request_accounts(&self) -> Result<Vec<Address>, Self::Error>;

    /// Subscribes to account and chain change notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;

    /// Instantiates a handle to the voting contract deployed at `contract`.
    async fn ledger_at(&self, contract: Address) -> Result<Self::Ledger, Self::Error>;
}
