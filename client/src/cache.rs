//! A read-through cache for candidate records shared by every page of a session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;
use votechain_ledger_interface::{
    Address, Candidate, CandidateId, NewCandidate, ProviderEvent, VotingLedger, WalletProvider,
    WriteReceipt,
};

type CandidateCache = Arc<Mutex<HashMap<CandidateId, Candidate>>>;

/// Wraps a [`VotingLedger`] and caches candidate records by id.
///
/// Any successful write through this handle empties the cache. Every other read goes
/// straight to the inner ledger.
pub struct CachedLedger<L> {
    inner: L,
    candidates: CandidateCache,
}

impl<L: VotingLedger> CachedLedger<L> {
    /// Wraps `inner` with an empty cache.
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            candidates: Default::default(),
        }
    }

    /// The number of cached candidate records.
    pub fn cached_len(&self) -> usize {
        self.lock().len()
    }

    /// Empties the cache.
    pub fn invalidate(&self) {
        debug!("Invalidating candidate cache");
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CandidateId, Candidate>> {
        self.candidates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cached(&self, id: CandidateId) -> Option<Candidate> {
        self.lock().get(&id).cloned()
    }

    // Pages re-read through the same handle right after a write, before the connection
    // context replaces it, so the write must not leave stale records behind.
    fn after_write(
        &self,
        result: Result<WriteReceipt, L::Error>,
    ) -> Result<WriteReceipt, L::Error> {
        if result.is_ok() {
            self.invalidate();
        }
        result
    }
}

#[async_trait]
impl<L: VotingLedger> VotingLedger for CachedLedger<L> {
    type Error = L::Error;

    async fn admin(&self) -> Result<Address, Self::Error> {
        self.inner.admin().await
    }

    async fn total_candidates(&self) -> Result<u64, Self::Error> {
        self.inner.total_candidates().await
    }

    async fn candidate(&self, id: CandidateId) -> Result<Candidate, Self::Error> {
        if let Some(candidate) = self.cached(id) {
            return Ok(candidate);
        }
        let candidate = self.inner.candidate(id).await?;
        self.lock().insert(id, candidate.clone());
        Ok(candidate)
    }

    async fn candidates(&self) -> Result<Vec<Candidate>, Self::Error> {
        let count = self.inner.total_candidates().await?;
        let cached: Option<Vec<Candidate>> = {
            let cache = self.lock();
            (0..count).map(|id| cache.get(&id).cloned()).collect()
        };
        if let Some(candidates) = cached {
            debug!(count, "Candidate list served from cache");
            return Ok(candidates);
        }

        let candidates = self.inner.candidates().await?;
        let mut cache = self.lock();
        for candidate in &candidates {
            cache.insert(candidate.id, candidate.clone());
        }
        Ok(candidates)
    }

    async fn has_voted(&self, voter: Address) -> Result<bool, Self::Error> {
        self.inner.has_voted(voter).await
    }

    async fn remaining_time(&self) -> Result<u64, Self::Error> {
        self.inner.remaining_time().await
    }

    async fn is_election_ended(&self) -> Result<bool, Self::Error> {
        self.inner.is_election_ended().await
    }

    async fn add_candidate(
        &self,
        from: Address,
        candidate: NewCandidate,
    ) -> Result<WriteReceipt, Self::Error> {
        let result = self.inner.add_candidate(from, candidate).await;
        self.after_write(result)
    }

    async fn deactivate_candidate(
        &self,
        from: Address,
        id: CandidateId,
    ) -> Result<WriteReceipt, Self::Error> {
        let result = self.inner.deactivate_candidate(from, id).await;
        self.after_write(result)
    }

    async fn start_election(
        &self,
        from: Address,
        duration: Duration,
    ) -> Result<WriteReceipt, Self::Error> {
        let result = self.inner.start_election(from, duration).await;
        self.after_write(result)
    }

    async fn end_election(&self, from: Address) -> Result<WriteReceipt, Self::Error> {
        let result = self.inner.end_election(from).await;
        self.after_write(result)
    }

    async fn vote(&self, from: Address, id: CandidateId) -> Result<WriteReceipt, Self::Error> {
        let result = self.inner.vote(from, id).await;
        self.after_write(result)
    }
}

/// Wraps a [`WalletProvider`] so that every ledger handle it produces is a
/// [`CachedLedger`].
pub struct CachingProvider<P> {
    inner: P,
}

impl<P: WalletProvider> CachingProvider<P> {
    /// Wraps `inner`.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: WalletProvider> WalletProvider for CachingProvider<P> {
    type Ledger = CachedLedger<P::Ledger>;
    type Error = P::Error;

    async fn chain_id(&self) -> Result<u64, Self::Error> {
        self.inner.chain_id().await
    }

    async fn accounts(&self) -> Result<Vec<Address>, Self::Error> {
        self.inner.accounts().await
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, Self::Error> {
        self.inner.request_accounts().await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.inner.subscribe()
    }

    async fn ledger_at(&self, contract: Address) -> Result<Self::Ledger, Self::Error> {
        Ok(CachedLedger::new(self.inner.ledger_at(contract).await?))
    }
}
