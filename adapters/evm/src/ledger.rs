use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers_core::abi::Detokenize;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{
    Bytes, Eip1559TransactionRequest, TransactionReceipt, TransactionRequest, U256, U64,
};
use ethers_middleware::SignerMiddleware;
use ethers_providers::{Http, Middleware, Provider};
use ethers_signers::LocalWallet;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::BatchRequestBuilder;
use jsonrpsee::http_client::HttpClient;
use jsonrpsee::rpc_params;
use tracing::{debug, info};
use votechain_ledger_interface::{
    Address, Candidate, CandidateId, NewCandidate, VotingLedger, WriteReceipt,
};

use crate::contract::{to_u64, VotingContract};
use crate::EvmError;

/// A handle to the voting contract deployed at one address.
///
/// Reads are `eth_call`s against the latest block. Writes are EIP-1559 transactions
/// signed with a loaded key, or handed to the node when it manages the sending account.
#[derive(Debug, Clone)]
pub struct EvmLedger {
    address: Address,
    chain_id: u64,
    confirmations: usize,
    contract: VotingContract,
    http_client: HttpClient,
    provider: Provider<Http>,
    signers: Arc<HashMap<Address, LocalWallet>>,
}

impl EvmLedger {
    pub(crate) fn new(
        address: Address,
        chain_id: u64,
        confirmations: usize,
        http_client: HttpClient,
        provider: Provider<Http>,
        signers: Arc<HashMap<Address, LocalWallet>>,
    ) -> Result<Self, EvmError> {
        Ok(Self {
            address,
            chain_id,
            confirmations,
            contract: VotingContract::new()?,
            http_client,
            provider,
            signers,
        })
    }

    /// The contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    fn call_request(&self, data: Bytes) -> TransactionRequest {
        TransactionRequest::new().to(self.address).data(data)
    }

    async fn eth_call(&self, method: &'static str, data: Bytes) -> Result<Bytes, EvmError> {
        debug!(method, contract = ?self.address, "eth_call");
        Ok(self
            .http_client
            .request("eth_call", rpc_params![self.call_request(data), "latest"])
            .await?)
    }

    async fn call<D: Detokenize>(&self, method: &'static str, data: Bytes) -> Result<D, EvmError> {
        let output = self.eth_call(method, data).await?;
        self.contract.decode(method, &output)
    }

    async fn read<D: Detokenize>(&self, method: &'static str) -> Result<D, EvmError> {
        let data = self.contract.encode(method, ())?;
        self.call(method, data).await
    }

    async fn send(
        &self,
        method: &'static str,
        from: Address,
        data: Bytes,
    ) -> Result<WriteReceipt, EvmError> {
        let request = Eip1559TransactionRequest::new()
            .from(from)
            .to(self.address)
            .chain_id(self.chain_id)
            .data(data);
        let tx = TypedTransaction::Eip1559(request);

        let receipt = match self.signers.get(&from) {
            Some(wallet) => {
                let client = SignerMiddleware::new(self.provider.clone(), wallet.clone());
                let pending = client
                    .send_transaction(tx, None)
                    .await
                    .map_err(|err| EvmError::Signer(err.to_string()))?;
                debug!(method, tx_hash = ?*pending, "Transaction submitted");
                pending.confirmations(self.confirmations).await?
            }
            None => {
                let pending = self.provider.send_transaction(tx, None).await?;
                debug!(method, tx_hash = ?*pending, "Transaction submitted to the node signer");
                pending.confirmations(self.confirmations).await?
            }
        };
        let receipt = confirmed(receipt)?;
        info!(method, tx_hash = ?receipt.transaction_hash, "Transaction confirmed");
        Ok(WriteReceipt {
            tx_hash: receipt.transaction_hash,
        })
    }
}

fn confirmed(receipt: Option<TransactionReceipt>) -> Result<TransactionReceipt, EvmError> {
    let receipt = receipt.ok_or(EvmError::Dropped)?;
    if receipt.status == Some(U64::zero()) {
        return Err(EvmError::Reverted(receipt.transaction_hash));
    }
    Ok(receipt)
}

#[async_trait]
impl VotingLedger for EvmLedger {
    type Error = EvmError;

    async fn admin(&self) -> Result<Address, Self::Error> {
        self.read("admin").await
    }

    async fn total_candidates(&self) -> Result<u64, Self::Error> {
        let count: U256 = self.read("getTotalCandidates").await?;
        to_u64(count, "Candidate count")
    }

    async fn candidate(&self, id: CandidateId) -> Result<Candidate, Self::Error> {
        let data = self.contract.get_candidate_call_data(id)?;
        let output = self.eth_call("getCandidate", data).await?;
        self.contract.decode_candidate(&output)
    }

    /// Reads the count, then every record in one JSON-RPC batch.
    async fn candidates(&self) -> Result<Vec<Candidate>, Self::Error> {
        let count = self.total_candidates().await?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut batch = BatchRequestBuilder::new();
        for id in 0..count {
            let data = self.contract.get_candidate_call_data(id)?;
            batch.insert("eth_call", rpc_params![self.call_request(data), "latest"])?;
        }
        debug!(count, "Batched getCandidate calls");
        let responses = self.http_client.batch_request::<Bytes>(batch).await?;

        let outputs = responses.into_ok().map_err(|errors| {
            let messages: Vec<String> = errors.map(|err| err.message().to_string()).collect();
            EvmError::Batch {
                failed: messages.len(),
                total: count as usize,
                first: messages.into_iter().next().unwrap_or_default(),
            }
        })?;
        outputs
            .map(|output| self.contract.decode_candidate(&output))
            .collect()
    }

    async fn has_voted(&self, voter: Address) -> Result<bool, Self::Error> {
        let data = self.contract.encode("checkIfVoted", voter)?;
        self.call("checkIfVoted", data).await
    }

    async fn remaining_time(&self) -> Result<u64, Self::Error> {
        let remaining: U256 = self.read("getRemainingTime").await?;
        to_u64(remaining, "Remaining time")
    }

    async fn is_election_ended(&self) -> Result<bool, Self::Error> {
        self.read("isElectionEnded").await
    }

    async fn add_candidate(
        &self,
        from: Address,
        candidate: NewCandidate,
    ) -> Result<WriteReceipt, Self::Error> {
        let data = self.contract.add_candidate_call_data(candidate)?;
        self.send("addCandidate", from, data).await
    }

    async fn deactivate_candidate(
        &self,
        from: Address,
        id: CandidateId,
    ) -> Result<WriteReceipt, Self::Error> {
        let data = self.contract.encode("deactivateCandidate", U256::from(id))?;
        self.send("deactivateCandidate", from, data).await
    }

    async fn start_election(
        &self,
        from: Address,
        duration: Duration,
    ) -> Result<WriteReceipt, Self::Error> {
        let data = self
            .contract
            .encode("startElection", U256::from(duration.as_secs()))?;
        self.send("startElection", from, data).await
    }

    async fn end_election(&self, from: Address) -> Result<WriteReceipt, Self::Error> {
        let data = self.contract.encode("endElection", ())?;
        self.send("endElection", from, data).await
    }

    async fn vote(&self, from: Address, id: CandidateId) -> Result<WriteReceipt, Self::Error> {
        let data = self.contract.encode("vote", U256::from(id))?;
        self.send("vote", from, data).await
    }
}
