//! Key management workflows for the VoteChain CLI wallet
use std::path::{Path, PathBuf};

use ethers_signers::{LocalWallet, Signer};

use crate::wallet_state::{KeyIdentifier, PrivateKeyAndAddress, WalletState};

#[derive(clap::Subcommand)]
/// View and manage keys associated with this wallet
pub enum KeyWorkflow {
    /// Generate a new key pair
    Generate {
        #[clap(short, long)]
        /// A nickname for this key pair
        nickname: Option<String>,
    },
    /// Import an existing key pair
    Import {
        #[clap(short, long)]
        /// A nickname for this key pair
        nickname: Option<String>,
        #[clap(short, long)]
        /// The path to the key file
        path: PathBuf,
    },
    /// List the keys in this wallet
    List,
    /// Set the active key
    Activate {
        /// The identifier of the key to activate
        #[clap(subcommand)]
        identifier: KeyIdentifier,
    },
}

impl KeyWorkflow {
    /// Run the key workflow to import, generate, activate, or list keys
    pub fn run(
        self,
        wallet_state: &mut WalletState,
        app_dir: impl AsRef<Path>,
    ) -> Result<(), anyhow::Error> {
        match self {
            KeyWorkflow::Generate { nickname } => {
                let wallet = LocalWallet::new(&mut rand::thread_rng());
                let address = wallet.address();
                let key_path = app_dir.as_ref().join(format!("{:?}.json", address));
                println!(
                    "Generated key pair with address: {:?}. Saving to {}",
                    address,
                    key_path.display()
                );
                let key = PrivateKeyAndAddress::from_wallet(&wallet);
                std::fs::write(&key_path, serde_json::to_string(&key)?)?;
                wallet_state.addresses.add(address, nickname, key_path);
            }
            KeyWorkflow::Import { nickname, path } => {
                // Try to load the key as a sanity check.
                let address = load_key(&path)?.address();
                if wallet_state.addresses.contains(&address) {
                    anyhow::bail!("Key for address {:?} is already in the wallet", address);
                }
                println!("Imported key pair. address: {:?}", address);
                wallet_state.addresses.add(address, nickname, path);
            }
            KeyWorkflow::List => {
                println!("{}", serde_json::to_string_pretty(&wallet_state.addresses)?)
            }
            KeyWorkflow::Activate { identifier } => {
                let active = wallet_state
                    .addresses
                    .active_address
                    .as_mut()
                    .ok_or_else(|| anyhow::anyhow!("The wallet holds no keys"))?;
                if active.matches(&identifier) {
                    println!("Key '{}' is already active", identifier);
                    return Ok(());
                }
                let requested = wallet_state
                    .addresses
                    .other_addresses
                    .iter_mut()
                    .find(|entry| entry.matches(&identifier))
                    .ok_or_else(|| anyhow::anyhow!("Could not find key {}", identifier))?;
                std::mem::swap(active, requested);
                println!("Activated key {}", identifier);
            }
        }
        Ok(())
    }
}

/// Load a key from the given path
pub fn load_key(path: impl AsRef<Path>) -> Result<LocalWallet, anyhow::Error> {
    PrivateKeyAndAddress::load(path)?.wallet()
}

