use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use ethers_providers::{Http, Provider};
use ethers_signers::{LocalWallet, Signer};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};
use votechain_ledger_interface::{Address, ProviderEvent, WalletProvider};

use crate::{EvmError, EvmLedger};

const EVENT_CAPACITY: usize = 16;
const PRIVATE_KEY_LEN: usize = 32;

/// Runtime configuration of the EVM wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmConfig {
    /// The JSON-RPC endpoint of the node.
    pub rpc_url: String,
    /// Blocks to wait for after a write is mined.
    pub confirmations: usize,
    /// Timeout of a single JSON-RPC request.
    pub request_timeout: Duration,
}

impl EvmConfig {
    /// A configuration with one confirmation and a 60 second request timeout.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            confirmations: 1,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Parses a hex-encoded secp256k1 private key, with or without the `0x` prefix.
pub fn wallet_from_hex(key: &str) -> Result<LocalWallet, EvmError> {
    let bytes = hex::decode(key.trim().trim_start_matches("0x"))
        .map_err(|err| EvmError::InvalidKey(err.to_string()))?;
    if bytes.len() != PRIVATE_KEY_LEN {
        return Err(EvmError::InvalidKey(format!(
            "expected {PRIVATE_KEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    LocalWallet::from_bytes(&bytes).map_err(|err| EvmError::InvalidKey(err.to_string()))
}

#[derive(Debug)]
struct ProviderState {
    /// Authorized accounts, active account first.
    accounts: Vec<Address>,
    last_chain_id: Option<u64>,
}

/// A [`WalletProvider`] backed by a JSON-RPC node and locally held signing keys.
///
/// With keys loaded, the authorized accounts are exactly the keys' addresses and the
/// first one is active. Without keys, the node's own `eth_accounts` are used and writes
/// are left to the node to sign.
#[derive(Debug, Clone)]
pub struct EvmWalletProvider {
    config: EvmConfig,
    http_client: HttpClient,
    provider: Provider<Http>,
    signers: Arc<HashMap<Address, LocalWallet>>,
    state: Arc<Mutex<ProviderState>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl EvmWalletProvider {
    /// Connects to the node at `config.rpc_url` holding `wallets`, the first one active.
    pub fn new(config: EvmConfig, wallets: Vec<LocalWallet>) -> Result<Self, EvmError> {
        let invalid_url = |reason: String| EvmError::InvalidUrl {
            url: config.rpc_url.clone(),
            reason,
        };
        let http_client = HttpClientBuilder::default()
            .request_timeout(config.request_timeout)
            .build(&config.rpc_url)
            .map_err(|err| invalid_url(err.to_string()))?;
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|err| invalid_url(err.to_string()))?;

        let accounts: Vec<Address> = wallets.iter().map(Signer::address).collect();
        let signers = wallets
            .into_iter()
            .map(|wallet| (wallet.address(), wallet))
            .collect();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(url = %config.rpc_url, keys = accounts.len(), "EVM wallet provider created");
        Ok(Self {
            config,
            http_client,
            provider,
            signers: Arc::new(signers),
            state: Arc::new(Mutex::new(ProviderState {
                accounts,
                last_chain_id: None,
            })),
            events,
        })
    }

    /// Makes `account` the active account and notifies subscribers.
    pub fn switch_account(&self, account: Address) -> Result<(), EvmError> {
        let accounts = {
            let mut state = self.lock();
            let position = state
                .accounts
                .iter()
                .position(|known| *known == account)
                .ok_or(EvmError::UnknownAccount(account))?;
            let active = state.accounts.remove(position);
            state.accounts.insert(0, active);
            state.accounts.clone()
        };
        info!(?account, "Active account switched");
        self.notify(ProviderEvent::AccountsChanged(accounts));
        Ok(())
    }

    /// Reads the node's chain id and notifies subscribers if it changed since the last
    /// read. Returns the new chain id on a change.
    pub async fn poll_chain(&self) -> Result<Option<u64>, EvmError> {
        let chain_id = self.chain_id_from_node().await?;
        let previous = self.lock().last_chain_id.replace(chain_id);
        match previous {
            Some(previous) if previous != chain_id => {
                warn!(previous, chain_id, "Network changed");
                self.notify(ProviderEvent::ChainChanged(chain_id));
                Ok(Some(chain_id))
            }
            _ => Ok(None),
        }
    }

    /// Polls the node's chain id every `period` until the returned task is aborted.
    ///
    /// A node has no push channel for chain changes; this task turns them into
    /// [`ProviderEvent::ChainChanged`] notifications. Failed polls are logged and retried.
    pub fn spawn_chain_watcher(&self, period: Duration) -> JoinHandle<()> {
        let provider = self.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = provider.poll_chain().await {
                    debug!(%err, "Chain id poll failed");
                }
            }
        })
    }

    async fn chain_id_from_node(&self) -> Result<u64, EvmError> {
        let chain_id: ethereum_types::U64 = self
            .http_client
            .request("eth_chainId", rpc_params![])
            .await?;
        Ok(chain_id.as_u64())
    }

    fn notify(&self, event: ProviderEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, ProviderState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl WalletProvider for EvmWalletProvider {
    type Ledger = EvmLedger;
    type Error = EvmError;

    async fn chain_id(&self) -> Result<u64, Self::Error> {
        let chain_id = self.chain_id_from_node().await?;
        self.lock().last_chain_id.get_or_insert(chain_id);
        debug!(chain_id, "eth_chainId");
        Ok(chain_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>, Self::Error> {
        let local = self.lock().accounts.clone();
        if !local.is_empty() {
            return Ok(local);
        }
        let accounts: Vec<Address> = self
            .http_client
            .request("eth_accounts", rpc_params![])
            .await?;
        debug!(accounts = accounts.len(), "eth_accounts");
        Ok(accounts)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, Self::Error> {
        // Loaded keys are authorized already, and nodes grant their accounts without a prompt.
        self.accounts().await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    async fn ledger_at(&self, contract: Address) -> Result<Self::Ledger, Self::Error> {
        let chain_id = self.chain_id().await?;
        let signers = self
            .signers
            .iter()
            .map(|(address, wallet)| (*address, wallet.clone().with_chain_id(chain_id)))
            .collect();
        EvmLedger::new(
            contract,
            chain_id,
            self.config.confirmations,
            self.http_client.clone(),
            self.provider.clone(),
            Arc::new(signers),
        )
    }
}
