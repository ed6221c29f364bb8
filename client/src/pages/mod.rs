//! Page view-models.
//!
//! Every page owns its own snapshot of ledger state. A page fetches on activation and
//! after each write it submits, and keeps its last good snapshot when a fetch fails.

pub mod admin;
pub mod home;
pub mod results;
pub mod vote;

use std::sync::Arc;

use votechain_ledger_interface::{Address, WalletProvider};

use crate::connection::ConnectionContext;
use crate::error::PageError;

/// Why a page cannot show its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocker {
    /// The connection context is still establishing the session.
    Connecting,
    /// The connection context failed. Carries its user-facing message.
    Connection(String),
    /// The page has not completed a fetch yet.
    Loading,
    /// The page's first fetch failed. Carries the user-facing message.
    Unavailable(String),
}

impl Blocker {
    /// The text shown in place of the page.
    pub fn message(&self) -> String {
        match self {
            Blocker::Connecting => "Connecting to blockchain...".to_string(),
            Blocker::Connection(message) | Blocker::Unavailable(message) => message.clone(),
            Blocker::Loading => "Loading...".to_string(),
        }
    }
}

/// Whether a page has data to show, and why not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum LoadState {
    #[default]
    Pending,
    Failed(PageError),
    Loaded,
}

impl LoadState {
    pub(crate) fn blocker(&self) -> Option<Blocker> {
        match self {
            LoadState::Pending => Some(Blocker::Loading),
            LoadState::Failed(err) => Some(Blocker::Unavailable(err.to_string())),
            LoadState::Loaded => None,
        }
    }

    /// Records a failed fetch. A page that already has data keeps showing it.
    pub(crate) fn fail(&mut self, err: PageError) {
        if *self != LoadState::Loaded {
            *self = LoadState::Failed(err);
        }
    }
}

/// The blocker the connection context imposes on every page, if any.
pub(crate) fn context_blocker<P: WalletProvider>(ctx: &ConnectionContext<P>) -> Option<Blocker> {
    if ctx.is_loading() {
        return Some(Blocker::Connecting);
    }
    ctx.error()
        .map(|err| Blocker::Connection(err.to_string()))
}

/// The ledger handle and active account of an established session.
pub(crate) fn session<P: WalletProvider>(
    ctx: &ConnectionContext<P>,
) -> Result<(Arc<P::Ledger>, Address), PageError> {
    match (ctx.ledger(), ctx.account()) {
        (Some(ledger), Some(account)) => Ok((ledger.clone(), account)),
        _ => Err(PageError::NotConnected),
    }
}
