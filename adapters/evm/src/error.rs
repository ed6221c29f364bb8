use ethers_contract::AbiError;
use ethers_providers::ProviderError;
use thiserror::Error;
use votechain_ledger_interface::{Address, TxHash};

/// Failures of the EVM adapter.
#[derive(Debug, Error)]
pub enum EvmError {
    /// The RPC url could not be used.
    #[error("Invalid RPC url {url}: {reason}")]
    InvalidUrl {
        /// The configured url.
        url: String,
        /// Why the client rejected it.
        reason: String,
    },

    /// A JSON value could not be (de)serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Call data or return data did not match the contract ABI.
    #[error(transparent)]
    Abi(#[from] AbiError),

    /// A JSON-RPC request failed, including reverted calls.
    #[error(transparent)]
    Rpc(#[from] jsonrpsee::core::Error),

    /// The ethers provider failed to send or track a transaction.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Signing or sending through the local key failed.
    #[error("Failed to sign or send the transaction: {0}")]
    Signer(String),

    /// A private key could not be parsed.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// Calls of a batch failed; the whole batch is discarded.
    #[error("{failed} of {total} batched calls failed: {first}")]
    Batch {
        /// Failed calls.
        failed: usize,
        /// Calls in the batch.
        total: usize,
        /// The first failure message.
        first: String,
    },

    /// A contract value exceeds `u64`.
    #[error("{0} returned by the contract does not fit in 64 bits")]
    ValueOverflow(&'static str),

    /// The transaction was mined with status 0.
    #[error("Transaction {0:?} reverted")]
    Reverted(TxHash),

    /// No receipt was produced for the transaction.
    #[error("Transaction was dropped before it was confirmed")]
    Dropped,

    /// The account is not one of the provider's accounts.
    #[error("No signing key is loaded for account {0:?}")]
    UnknownAccount(Address),
}
