use ethers_contract::BaseContract;
use ethers_core::abi::{Abi, Detokenize, Tokenize};
use ethers_core::types::{Bytes, U256};
use votechain_ledger_interface::{Candidate, CandidateId, NewCandidate};

use crate::EvmError;

const VOTING_ABI: &str = include_str!("abi/Voting.abi");

/// The `getCandidate` output: id, name, party, constituency, logo url, votes, active.
type CandidateRecord = (U256, String, String, String, String, U256, bool);

/// Encodes calls to the voting contract and decodes what it returns.
#[derive(Debug, Clone)]
pub struct VotingContract {
    base_contract: BaseContract,
}

impl VotingContract {
    /// Loads the embedded contract ABI.
    pub fn new() -> Result<Self, EvmError> {
        let abi: Abi = serde_json::from_str(VOTING_ABI)?;
        Ok(Self {
            base_contract: BaseContract::from(abi),
        })
    }

    /// Call data for `method` with `args`.
    pub fn encode<T: Tokenize>(&self, method: &str, args: T) -> Result<Bytes, EvmError> {
        Ok(self.base_contract.encode(method, args)?)
    }

    /// Decodes the output of `method`.
    pub fn decode<D: Detokenize>(&self, method: &str, output: &Bytes) -> Result<D, EvmError> {
        Ok(self.base_contract.decode_output(method, output)?)
    }

    pub fn get_candidate_call_data(&self, id: CandidateId) -> Result<Bytes, EvmError> {
        self.encode("getCandidate", U256::from(id))
    }

    pub fn add_candidate_call_data(&self, candidate: NewCandidate) -> Result<Bytes, EvmError> {
        self.encode(
            "addCandidate",
            (
                candidate.name,
                candidate.party,
                candidate.constituency,
                candidate.logo_url,
            ),
        )
    }

    /// Decodes a `getCandidate` output into a [`Candidate`].
    pub fn decode_candidate(&self, output: &Bytes) -> Result<Candidate, EvmError> {
        let (id, name, party, constituency, logo_url, votes, active): CandidateRecord =
            self.decode("getCandidate", output)?;
        Ok(Candidate {
            id: to_u64(id, "Candidate id")?,
            name,
            party,
            constituency,
            logo_url,
            vote_count: to_u64(votes, "Vote count")?,
            active,
        })
    }
}

/// Narrows a contract integer to `u64`.
pub(crate) fn to_u64(value: U256, what: &'static str) -> Result<u64, EvmError> {
    if value > U256::from(u64::MAX) {
        return Err(EvmError::ValueOverflow(what));
    }
    Ok(value.as_u64())
}
