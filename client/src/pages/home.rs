use tracing::{error, info};
use votechain_ledger_interface::{Address, WalletProvider};

use crate::connection::ConnectionContext;
use crate::error::ConnectionError;

/// What the landing page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeView {
    /// The connected account, or `None` to show the "connect wallet" prompt.
    pub account: Option<Address>,
    /// The connection error, if any.
    pub error: Option<String>,
    /// Whether the "cast your vote" entry is enabled.
    pub can_cast_vote: bool,
}

/// Derives the landing page from the connection context.
pub fn view<P: WalletProvider>(ctx: &ConnectionContext<P>) -> HomeView {
    HomeView {
        account: ctx.account(),
        error: ctx.error().map(ToString::to_string),
        can_cast_vote: ctx.account().is_some(),
    }
}

/// Asks the wallet provider to authorize an account, then re-initializes the context.
pub async fn connect_wallet<P: WalletProvider>(
    ctx: &mut ConnectionContext<P>,
) -> Result<(), ConnectionError> {
    let provider = ctx
        .provider()
        .cloned()
        .ok_or(ConnectionError::ProviderMissing)?;
    let accounts = provider.request_accounts().await.map_err(|err| {
        error!(%err, "Wallet connection error");
        ConnectionError::AccountUnavailable
    })?;
    info!(authorized = accounts.len(), "Wallet connected");
    ctx.refresh().await;
    match ctx.error() {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}
