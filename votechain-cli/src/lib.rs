#![deny(missing_docs)]
#![doc = include_str!("../README.md")]
use std::env;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

pub mod wallet_state;
pub mod workflows;

pub use clap;
pub use wallet_state::{AddressEntry, AddressList, KeyIdentifier, PrivateKeyAndAddress, WalletState};
pub use workflows::keys::KeyWorkflow;
pub use workflows::pages::{AdminWorkflow, HomeWorkflow, VoteWorkflow};

const VOTECHAIN_WALLET_DIR: &str = "VOTECHAIN_WALLET_DIR";

/// The directory where the wallet is stored.
pub fn wallet_dir() -> Result<impl AsRef<Path>, anyhow::Error> {
    // First try to parse from the env variable
    if let Ok(val) = env::var(VOTECHAIN_WALLET_DIR) {
        return Ok(PathBuf::from(val));
    }

    // Fall back to the user's home directory
    let dir = BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory. You can set a wallet directory using the {} environment variable", VOTECHAIN_WALLET_DIR))?
        .home_dir()
        .join(".votechain_cli_wallet");

    Ok(dir)
}
