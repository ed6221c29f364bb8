use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::mocks::MockLedger;
use crate::{Address, ProviderEvent, WalletProvider};

/// Failures produced by [`MockWalletProvider`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MockWalletError {
    /// The user declined the authorization prompt.
    #[error("User rejected the request")]
    Rejected,
}

#[derive(Debug)]
struct WalletState {
    chain_id: u64,
    accounts: Vec<Address>,
    grant_on_request: Option<Vec<Address>>,
    calls: Vec<&'static str>,
}

/// A wallet provider used in tests.
///
/// Every ledger handle it produces shares state with the [`MockLedger`] it was built
/// with. Clones share state as well.
#[derive(Debug, Clone)]
pub struct MockWalletProvider {
    ledger: MockLedger,
    state: Arc<Mutex<WalletState>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockWalletProvider {
    /// Creates a provider connected to `chain_id` with no authorized accounts.
    /// An authorization request is rejected until [`MockWalletProvider::grant_on_request`]
    /// is called.
    pub fn new(chain_id: u64, ledger: MockLedger) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            ledger,
            state: Arc::new(Mutex::new(WalletState {
                chain_id,
                accounts: Vec::new(),
                grant_on_request: None,
                calls: Vec::new(),
            })),
            events,
        }
    }

    /// Builder-style helper which pre-authorizes `accounts`.
    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.lock().accounts = accounts;
        self
    }

    /// The accounts a later authorization request will grant.
    pub fn grant_on_request(&self, accounts: Vec<Address>) {
        self.lock().grant_on_request = Some(accounts);
    }

    /// Replaces the authorized accounts and notifies subscribers.
    pub fn change_accounts(&self, accounts: Vec<Address>) {
        self.lock().accounts = accounts.clone();
        // Nobody listening is not an error.
        let _ = self.events.send(ProviderEvent::AccountsChanged(accounts));
    }

    /// Switches to another chain and notifies subscribers.
    pub fn change_chain(&self, chain_id: u64) {
        self.lock().chain_id = chain_id;
        let _ = self.events.send(ProviderEvent::ChainChanged(chain_id));
    }

    /// The names of the provider methods called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, WalletState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, method: &'static str) -> MutexGuard<'_, WalletState> {
        let mut state = self.lock();
        state.calls.push(method);
        state
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    type Ledger = MockLedger;
    type Error = MockWalletError;

    async fn chain_id(&self) -> Result<u64, Self::Error> {
        Ok(self.record("eth_chainId").chain_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>, Self::Error> {
        Ok(self.record("eth_accounts").accounts.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, Self::Error> {
        let mut state = self.record("eth_requestAccounts");
        let granted = state.grant_on_request.take().ok_or(MockWalletError::Rejected)?;
        state.accounts = granted.clone();
        Ok(granted)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    async fn ledger_at(&self, _contract: Address) -> Result<Self::Ledger, Self::Error> {
        self.record("ledger_at");
        Ok(self.ledger.clone())
    }
}
