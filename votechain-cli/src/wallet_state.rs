//! The on-disk state of the CLI wallet
use std::fs;
use std::path::{Path, PathBuf};

use ethers_signers::{LocalWallet, Signer};
use serde::{Deserialize, Serialize};
use votechain_evm_adapter::wallet_from_hex;
use votechain_ledger_interface::Address;

/// A struct representing the current state of the CLI wallet
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WalletState {
    /// The addresses in the wallet
    pub addresses: AddressList,
}

impl WalletState {
    /// Load the wallet state from the given path on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        if path.exists() {
            let data = fs::read(path)?;
            let state = serde_json::from_slice(data.as_slice())?;
            Ok(state)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the wallet state to the given path on disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), anyhow::Error> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Loads the signing key of every address, active address first.
    pub fn load_wallets(&self) -> Result<Vec<LocalWallet>, anyhow::Error> {
        self.addresses
            .iter()
            .map(|entry| {
                let key = PrivateKeyAndAddress::load(&entry.location)?;
                if key.address != entry.address {
                    anyhow::bail!(
                        "Key file {} holds the key of {:?}, expected {:?}",
                        entry.location.display(),
                        key.address,
                        entry.address
                    );
                }
                key.wallet()
            })
            .collect()
    }
}

/// A list of addresses associated with this wallet
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AddressList {
    /// Any addresses which are known by the wallet but not currently active
    pub other_addresses: Vec<AddressEntry>,
    /// The address which is currently active
    pub active_address: Option<AddressEntry>,
}

impl AddressList {
    /// Get the active address
    pub fn default_address(&self) -> Option<&AddressEntry> {
        self.active_address.as_ref()
    }

    /// Add an address to the wallet
    pub fn add(&mut self, address: Address, nickname: Option<String>, location: PathBuf) {
        let entry = AddressEntry {
            address,
            nickname,
            location,
        };
        if self.active_address.is_none() {
            self.active_address = Some(entry);
        } else {
            self.other_addresses.push(entry);
        }
    }

    /// Every address, the active one first
    pub fn iter(&self) -> impl Iterator<Item = &AddressEntry> {
        self.active_address.iter().chain(self.other_addresses.iter())
    }

    /// Whether the wallet already knows `address`
    pub fn contains(&self, address: &Address) -> bool {
        self.iter().any(|entry| &entry.address == address)
    }
}

/// An entry in the address list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressEntry {
    /// The address
    pub address: Address,
    /// A user-provided nickname
    pub nickname: Option<String>,
    /// The location of the private key on disk
    pub location: PathBuf,
}

impl AddressEntry {
    /// Check if the address entry matches the given nickname
    pub fn is_nicknamed(&self, nickname: &str) -> bool {
        self.nickname.as_deref() == Some(nickname)
    }

    /// Check if the address entry matches the given identifier
    pub fn matches(&self, identifier: &KeyIdentifier) -> bool {
        match identifier {
            KeyIdentifier::ByNickname { nickname } => self.is_nicknamed(nickname),
            KeyIdentifier::ByAddress { address } => &self.address == address,
        }
    }
}

/// An identifier for a key in the wallet
#[derive(Debug, clap::Subcommand, Clone)]
pub enum KeyIdentifier {
    /// Select a key by nickname
    ByNickname {
        /// The nickname
        nickname: String,
    },
    /// Select a key by its associated address
    ByAddress {
        /// The address
        address: Address,
    },
}

impl std::fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyIdentifier::ByNickname { nickname } => nickname.fmt(f),
            KeyIdentifier::ByAddress { address } => write!(f, "{:?}", address),
        }
    }
}

/// A private key file: the hex-encoded secp256k1 key and the address it controls.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrivateKeyAndAddress {
    /// The hex-encoded private key
    pub private_key: String,
    /// The address of the key
    pub address: Address,
}

impl PrivateKeyAndAddress {
    /// Describes `wallet` as a key file.
    pub fn from_wallet(wallet: &LocalWallet) -> Self {
        Self {
            private_key: hex::encode(wallet.signer().to_bytes()),
            address: wallet.address(),
        }
    }

    /// Reads a key file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let data = fs::read(path)?;
        let key = serde_json::from_slice(data.as_slice())?;
        Ok(key)
    }

    /// The signing key, checked against the recorded address.
    pub fn wallet(&self) -> Result<LocalWallet, anyhow::Error> {
        let wallet = wallet_from_hex(&self.private_key)?;
        if wallet.address() != self.address {
            anyhow::bail!(
                "Private key controls {:?}, not the recorded address {:?}",
                wallet.address(),
                self.address
            );
        }
        Ok(wallet)
    }
}
