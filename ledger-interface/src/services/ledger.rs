//! The ledger module defines the surface of the deployed voting contract.
use std::fmt::{self, Display};
use std::time::Duration;

use async_trait::async_trait;

use crate::{Address, Candidate, CandidateId, NewCandidate, WriteReceipt};

/// A `VotingLedger` is the local side of a connection to the voting contract.
///
/// Every invariant of the election (one ballot per address, admin-only administration,
/// the voting window) is enforced by the implementation on the other side of this trait.
/// Callers never assume a write succeeded until it returns `Ok`.
///
/// Writes take the address they are signed by. Implementations reject writes for
/// accounts they cannot sign for.
#[async_trait]
pub trait VotingLedger: Send + Sync + 'static {
    /// The error type for fallible methods. Rejections by the contract and transport
    /// failures share this type.
    type Error: fmt::Debug + Display + Send + Sync + 'static;

    /// The address the contract recorded as its admin.
    async fn admin(&self) -> Result<Address, Self::Error>;

    /// The number of registered candidates, active or not.
    async fn total_candidates(&self) -> Result<u64, Self::Error>;

    /// The candidate registered under the given ordinal id.
    async fn candidate(&self, id: CandidateId) -> Result<Candidate, Self::Error>;

    /// Every registered candidate, in ordinal order.
    ///
    /// The default reads the count and then each record in turn, one round trip per
    /// candidate. Implementations that can batch reads should override it, keeping the
    /// ordinal ordering.
    async fn candidates(&self) -> Result<Vec<Candidate>, Self::Error> {
        let count = self.total_candidates().await?;
        // The count comes from the ledger; grow with the records actually read.
        let mut candidates = Vec::new();
        for id in 0..count {
            candidates.push(self.candidate(id).await?);
        }
        Ok(candidates)
    }

    /// Whether `voter` has already cast a ballot.
    async fn has_voted(&self, voter: Address) -> Result<bool, Self::Error>;

    /// Seconds until the election window closes, or zero if no window is open.
    async fn remaining_time(&self) -> Result<u64, Self::Error>;

    /// Whether the election reached its terminal phase.
    async fn is_election_ended(&self) -> Result<bool, Self::Error>;

    /// Registers a candidate. Admin only.
    async fn add_candidate(
        &self,
        from: Address,
        candidate: NewCandidate,
    ) -> Result<WriteReceipt, Self::Error>;

    /// Soft-deletes a candidate. Admin only.
    async fn deactivate_candidate(
        &self,
        from: Address,
        id: CandidateId,
    ) -> Result<WriteReceipt, Self::Error>;

    /// Opens the voting window for `duration`. Admin only.
    async fn start_election(
        &self,
        from: Address,
        duration: Duration,
    ) -> Result<WriteReceipt, Self::Error>;

    /// Closes the voting window immediately. Admin only.
    async fn end_election(&self, from: Address) -> Result<WriteReceipt, Self::Error>;

    /// Casts the ballot of `from` for candidate `id`. Accepted once per address.
    async fn vote(&self, from: Address, id: CandidateId) -> Result<WriteReceipt, Self::Error>;
}
