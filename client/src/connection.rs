//! The session between the client, the user's wallet, and the voting contract.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use votechain_ledger_interface::{Address, ProviderEvent, VotingLedger, WalletProvider};

use crate::error::ConnectionError;

/// What the owner of a [`ConnectionContext`] has to do after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The context re-initialized itself for the new account.
    Refreshed,
    /// Every account was disconnected. The context holds no account until the next
    /// account change or manual refresh.
    Disconnected,
    /// The provider moved to another network. The context discarded its state and must
    /// be rebuilt from scratch.
    ReloadRequired,
}

/// Everything the pages need to know about the session.
#[derive(Debug)]
struct ConnectionState<L> {
    account: Option<Address>,
    ledger: Option<Arc<L>>,
    is_admin: bool,
    loading: bool,
    error: Option<ConnectionError>,
}

impl<L> ConnectionState<L> {
    fn initial() -> Self {
        Self {
            account: None,
            ledger: None,
            is_admin: false,
            loading: true,
            error: None,
        }
    }
}

struct Session<L> {
    account: Address,
    ledger: Arc<L>,
    is_admin: bool,
}

/// The connection context owns the session with the wallet provider.
///
/// It is created once per application load and passed explicitly to every page. It starts
/// in the loading state; call [`ConnectionContext::refresh`] to establish the session.
pub struct ConnectionContext<P: WalletProvider> {
    provider: Option<Arc<P>>,
    expected_chain_id: u64,
    contract: Address,
    state: ConnectionState<P::Ledger>,
}

impl<P: WalletProvider> ConnectionContext<P> {
    /// Creates a context for the contract at `contract` on chain `expected_chain_id`.
    /// `provider` is `None` when no wallet provider is installed.
    pub fn new(provider: Option<Arc<P>>, expected_chain_id: u64, contract: Address) -> Self {
        Self {
            provider,
            expected_chain_id,
            contract,
            state: ConnectionState::initial(),
        }
    }

    /// The wallet provider, if one is installed.
    pub fn provider(&self) -> Option<&Arc<P>> {
        self.provider.as_ref()
    }

    /// The active account.
    pub fn account(&self) -> Option<Address> {
        self.state.account
    }

    /// The handle to the voting contract.
    pub fn ledger(&self) -> Option<&Arc<P::Ledger>> {
        self.state.ledger.as_ref()
    }

    /// Whether the active account is the contract's admin.
    pub fn is_admin(&self) -> bool {
        self.state.is_admin
    }

    /// Whether the session is being (re-)established.
    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    /// The error that stopped the last initialization.
    pub fn error(&self) -> Option<&ConnectionError> {
        self.state.error.as_ref()
    }

    /// Re-initializes the session from scratch.
    ///
    /// Failures never escape: they are logged and stored as the context's error.
    pub async fn refresh(&mut self) {
        self.state = ConnectionState::initial();
        match self.establish().await {
            Ok(session) => {
                info!(
                    account = ?session.account,
                    is_admin = session.is_admin,
                    "Connected to the voting contract"
                );
                self.state.account = Some(session.account);
                self.state.ledger = Some(session.ledger);
                self.state.is_admin = session.is_admin;
            }
            Err(err) => {
                warn!(%err, "Unable to establish a ledger session");
                self.state.error = Some(err);
            }
        }
        self.state.loading = false;
    }

    async fn establish(&self) -> Result<Session<P::Ledger>, ConnectionError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(ConnectionError::ProviderMissing)?;

        let actual = provider.chain_id().await.map_err(load_failed)?;
        if actual != self.expected_chain_id {
            return Err(ConnectionError::WrongNetwork {
                expected: self.expected_chain_id,
                actual,
            });
        }

        let mut accounts = provider.accounts().await.map_err(load_failed)?;
        if accounts.is_empty() {
            debug!("No authorized accounts, requesting authorization");
            accounts = provider.request_accounts().await.map_err(|err| {
                warn!(%err, "Account authorization request failed");
                ConnectionError::AccountUnavailable
            })?;
        }
        let account = *accounts.first().ok_or(ConnectionError::AccountUnavailable)?;

        let ledger = provider
            .ledger_at(self.contract)
            .await
            .map_err(load_failed)?;
        let admin = ledger.admin().await.map_err(load_failed)?;

        Ok(Session {
            account,
            ledger: Arc::new(ledger),
            is_admin: account == admin,
        })
    }

    /// Applies a notification from the wallet provider.
    pub async fn handle_event(&mut self, event: ProviderEvent) -> EventOutcome {
        match event {
            ProviderEvent::AccountsChanged(accounts) if !accounts.is_empty() => {
                info!(account = ?accounts[0], "Active account changed");
                self.refresh().await;
                EventOutcome::Refreshed
            }
            ProviderEvent::AccountsChanged(_) => {
                info!("All accounts disconnected");
                self.state.account = None;
                self.state.is_admin = false;
                EventOutcome::Disconnected
            }
            ProviderEvent::ChainChanged(chain_id) => {
                info!(chain_id, "Network changed, the session must be rebuilt");
                self.state = ConnectionState::initial();
                EventOutcome::ReloadRequired
            }
        }
    }

    /// Waits for the next provider notification and applies it.
    ///
    /// Returns `None` once the provider closed its notification channel. Missed
    /// notifications cannot be replayed, so a lagging subscription refreshes the session.
    pub async fn next_event(
        &mut self,
        events: &mut broadcast::Receiver<ProviderEvent>,
    ) -> Option<EventOutcome> {
        match events.recv().await {
            Ok(event) => Some(self.handle_event(event).await),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed provider notifications, refreshing");
                self.refresh().await;
                Some(EventOutcome::Refreshed)
            }
            Err(RecvError::Closed) => None,
        }
    }
}

fn load_failed<E: std::fmt::Display>(err: E) -> ConnectionError {
    error!(%err, "Blockchain load error");
    ConnectionError::LoadFailed
}
