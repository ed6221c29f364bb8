use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use votechain_ledger_interface::Address;

/// The network the voting contract is deployed on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkConfig {
    /// Chain id the wallet must be connected to. Accepts an integer or a `0x` hex string.
    #[serde(deserialize_with = "chain_id::deserialize")]
    pub chain_id: u64,
    /// Human readable chain name.
    pub chain_name: String,
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Block explorers for the chain.
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
    /// The chain's native currency.
    pub native_currency: Option<NativeCurrency>,
    /// How often long-running commands poll the node for a network change.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl NetworkConfig {
    /// [`NetworkConfig::poll_interval_secs`] as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Native currency metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NativeCurrency {
    /// Currency name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Number of decimals.
    pub decimals: u8,
}

/// Where the voting contract lives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LedgerConfig {
    /// Address of the deployed contract.
    pub contract_address: Address,
    /// Blocks to wait for before a write counts as accepted.
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
}

/// Election parameters used by the admin page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElectionConfig {
    /// Length of the voting window opened by "start election".
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u64,
}

impl ElectionConfig {
    /// [`ElectionConfig::default_duration_secs`] as a [`Duration`].
    pub fn default_duration(&self) -> Duration {
        Duration::from_secs(self.default_duration_secs)
    }
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_duration_secs(),
        }
    }
}

/// Candidate cache configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CacheConfig {
    /// Share candidate records between pages until the next write.
    #[serde(default)]
    pub enabled: bool,
}

/// Client Configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    /// Network configuration.
    pub network: NetworkConfig,
    /// Contract configuration.
    pub ledger: LedgerConfig,
    /// Election configuration.
    #[serde(default)]
    pub election: ElectionConfig,
    /// Cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_confirmations() -> usize {
    1
}

fn default_poll_interval_secs() -> u64 {
    4
}

fn default_duration_secs() -> u64 {
    24 * 60 * 60
}

/// Reads a TOML file and deserializes it into `R`.
pub fn from_toml_path<P: AsRef<Path>, R: DeserializeOwned>(path: P) -> anyhow::Result<R> {
    let mut contents = String::new();
    {
        let mut file = File::open(path)?;
        file.read_to_string(&mut contents)?;
    }

    let result: R = toml::from_str(&contents)?;

    Ok(result)
}

mod chain_id {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Number(id) => Ok(id),
            Repr::Text(text) => {
                let text = text.trim();
                match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => text.parse(),
                }
                .map_err(|e| D::Error::custom(format!("invalid chain id '{text}': {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::str::FromStr;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_config_from(content: &str) -> NamedTempFile {
        let mut config_file = NamedTempFile::new().unwrap();
        config_file.write_all(content.as_bytes()).unwrap();
        config_file
    }

    #[test]
    fn test_correct_config() {
        let config = r#"
            [network]
            chain_id = "0xaa36a7"
            chain_name = "Sepolia Testnet"
            rpc_url = "https://sepolia.infura.io/v3/"
            block_explorer_urls = ["https://sepolia.etherscan.io"]
            poll_interval_secs = 10
            [network.native_currency]
            name = "SepoliaETH"
            symbol = "ETH"
            decimals = 18
            [ledger]
            contract_address = "0xFD953Ef6Fa10D7fe03454329A8448Fa318Ad229A"
            confirmations = 2
            [election]
            default_duration_secs = 3600
            [cache]
            enabled = true
        "#;

        let config_file = create_config_from(config);

        let config: ClientConfig = from_toml_path(config_file.path()).unwrap();
        let expected = ClientConfig {
            network: NetworkConfig {
                chain_id: 11155111,
                chain_name: "Sepolia Testnet".to_string(),
                rpc_url: "https://sepolia.infura.io/v3/".to_string(),
                block_explorer_urls: vec!["https://sepolia.etherscan.io".to_string()],
                native_currency: Some(NativeCurrency {
                    name: "SepoliaETH".to_string(),
                    symbol: "ETH".to_string(),
                    decimals: 18,
                }),
                poll_interval_secs: 10,
            },
            ledger: LedgerConfig {
                contract_address: Address::from_str("0xfd953ef6fa10d7fe03454329a8448fa318ad229a")
                    .unwrap(),
                confirmations: 2,
            },
            election: ElectionConfig {
                default_duration_secs: 3600,
            },
            cache: CacheConfig { enabled: true },
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = r#"
            [network]
            chain_id = 1337
            chain_name = "Development"
            rpc_url = "http://127.0.0.1:8556"
            [ledger]
            contract_address = "0x0000000000000000000000000000000000000042"
        "#;

        let config_file = create_config_from(config);

        let config: ClientConfig = from_toml_path(config_file.path()).unwrap();
        assert_eq!(config.network.chain_id, 1337);
        assert_eq!(config.ledger.confirmations, 1);
        assert_eq!(config.network.poll_interval(), Duration::from_secs(4));
        assert_eq!(config.election.default_duration(), Duration::from_secs(86400));
        assert!(!config.cache.enabled);
        assert!(config.network.native_currency.is_none());
    }

    #[test]
    fn test_invalid_chain_id_is_rejected() {
        let config = r#"
            [network]
            chain_id = "0xnothex"
            chain_name = "Broken"
            rpc_url = "http://127.0.0.1:8556"
            [ledger]
            contract_address = "0x0000000000000000000000000000000000000042"
        "#;

        let config_file = create_config_from(config);

        let err = from_toml_path::<_, ClientConfig>(config_file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid chain id"), "{err}");
    }
}
