use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

use crate::{Address, Candidate, CandidateId, NewCandidate, TxHash, VotingLedger, WriteReceipt};

/// Rejections produced by [`MockLedger`], mirroring the contract's own checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MockLedgerError {
    /// A mutating call other than `vote` came from a non-admin account.
    #[error("Only the admin can perform this action")]
    NotAdmin,
    /// The account already voted.
    #[error("Address {0:?} has already voted")]
    AlreadyVoted(Address),
    /// A ballot arrived outside the voting window.
    #[error("The election is not active")]
    ElectionNotActive,
    /// `startElection` was called while a window is open.
    #[error("The election is already active")]
    ElectionAlreadyActive,
    /// `startElection` was called with a zero duration.
    #[error("Election duration must be positive")]
    InvalidDuration,
    /// No candidate was registered under the id.
    #[error("Candidate {0} does not exist")]
    UnknownCandidate(CandidateId),
    /// The candidate was deactivated.
    #[error("Candidate {0} is not active")]
    CandidateInactive(CandidateId),
    /// The mock was switched offline with [`MockLedger::set_unavailable`].
    #[error("Ledger unavailable")]
    Unavailable,
}

#[derive(Debug)]
struct LedgerState {
    admin: Address,
    candidates: Vec<Candidate>,
    voters: HashSet<Address>,
    window_closes_at: Option<Instant>,
    ended: bool,
    unavailable: bool,
    calls: Vec<&'static str>,
    tx_counter: u64,
}

impl LedgerState {
    fn remaining(&self) -> u64 {
        if self.ended {
            return 0;
        }
        self.window_closes_at
            .map(|closes_at| {
                let left = closes_at.saturating_duration_since(Instant::now());
                // Round up so a window with half a second left still reads as open.
                left.as_secs() + u64::from(left.subsec_nanos() > 0)
            })
            .unwrap_or_default()
    }

    fn is_ended(&self) -> bool {
        self.ended
            || self
                .window_closes_at
                .map(|closes_at| Instant::now() >= closes_at)
                .unwrap_or(false)
    }

    fn ensure_admin(&self, from: Address) -> Result<(), MockLedgerError> {
        if from != self.admin {
            return Err(MockLedgerError::NotAdmin);
        }
        Ok(())
    }

    fn next_receipt(&mut self) -> WriteReceipt {
        self.tx_counter += 1;
        WriteReceipt {
            tx_hash: TxHash::from_low_u64_be(self.tx_counter),
        }
    }
}

/// An in-memory voting contract used in tests.
///
/// Clones share state, so a test can keep one handle to inspect calls while the
/// client under test owns another. Time is read from `tokio::time`, which lets tests
/// drive the voting window with a paused clock.
#[derive(Debug, Clone)]
pub struct MockLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MockLedger {
    /// Creates an empty ledger administered by `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState {
                admin,
                candidates: Vec::new(),
                voters: HashSet::new(),
                window_closes_at: None,
                ended: false,
                unavailable: false,
                calls: Vec::new(),
                tx_counter: 0,
            })),
        }
    }

    /// Inserts a candidate with a preset tally, bypassing admin checks and the call log.
    pub fn seed_candidate(&self, name: &str, vote_count: u64, active: bool) -> CandidateId {
        let mut state = self.lock();
        let id = state.candidates.len() as CandidateId;
        state.candidates.push(Candidate {
            id,
            name: name.to_string(),
            party: format!("{name} Party"),
            constituency: "Central".to_string(),
            logo_url: format!("https://example.com/{id}.png"),
            vote_count,
            active,
        });
        id
    }

    /// Records `voter` as having voted, bypassing the call log.
    pub fn seed_voter(&self, voter: Address) {
        self.lock().voters.insert(voter);
    }

    /// Opens the voting window for `duration`, bypassing admin checks and the call log.
    pub fn seed_open_window(&self, duration: Duration) {
        let mut state = self.lock();
        state.window_closes_at = Some(Instant::now() + duration);
        state.ended = false;
    }

    /// Marks the election as ended, bypassing admin checks and the call log.
    pub fn seed_ended(&self) {
        let mut state = self.lock();
        state.ended = true;
        state.window_closes_at = None;
    }

    /// When set, every call fails with [`MockLedgerError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// The names of the contract methods called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    /// Forgets the calls recorded so far.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// The current candidate records.
    pub fn snapshot(&self) -> Vec<Candidate> {
        self.lock().candidates.clone()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // A test that panicked while holding the lock already failed.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, method: &'static str) -> Result<MutexGuard<'_, LedgerState>, MockLedgerError> {
        let mut state = self.lock();
        state.calls.push(method);
        tracing::trace!(method, "MockLedger call");
        if state.unavailable {
            return Err(MockLedgerError::Unavailable);
        }
        Ok(state)
    }
}

#[async_trait]
impl VotingLedger for MockLedger {
    type Error = MockLedgerError;

    async fn admin(&self) -> Result<Address, Self::Error> {
        Ok(self.enter("admin")?.admin)
    }

    async fn total_candidates(&self) -> Result<u64, Self::Error> {
        Ok(self.enter("getTotalCandidates")?.candidates.len() as u64)
    }

    async fn candidate(&self, id: CandidateId) -> Result<Candidate, Self::Error> {
        let state = self.enter("getCandidate")?;
        state
            .candidates
            .get(id as usize)
            .cloned()
            .ok_or(MockLedgerError::UnknownCandidate(id))
    }

    async fn has_voted(&self, voter: Address) -> Result<bool, Self::Error> {
        Ok(self.enter("checkIfVoted")?.voters.contains(&voter))
    }

    async fn remaining_time(&self) -> Result<u64, Self::Error> {
        Ok(self.enter("getRemainingTime")?.remaining())
    }

    async fn is_election_ended(&self) -> Result<bool, Self::Error> {
        Ok(self.enter("isElectionEnded")?.is_ended())
    }

    async fn add_candidate(
        &self,
        from: Address,
        candidate: NewCandidate,
    ) -> Result<WriteReceipt, Self::Error> {
        let mut state = self.enter("addCandidate")?;
        state.ensure_admin(from)?;
        let id = state.candidates.len() as CandidateId;
        state.candidates.push(Candidate {
            id,
            name: candidate.name,
            party: candidate.party,
            constituency: candidate.constituency,
            logo_url: candidate.logo_url,
            vote_count: 0,
            active: true,
        });
        Ok(state.next_receipt())
    }

    async fn deactivate_candidate(
        &self,
        from: Address,
        id: CandidateId,
    ) -> Result<WriteReceipt, Self::Error> {
        let mut state = self.enter("deactivateCandidate")?;
        state.ensure_admin(from)?;
        let candidate = state
            .candidates
            .get_mut(id as usize)
            .ok_or(MockLedgerError::UnknownCandidate(id))?;
        if !candidate.active {
            return Err(MockLedgerError::CandidateInactive(id));
        }
        candidate.active = false;
        Ok(state.next_receipt())
    }

    async fn start_election(
        &self,
        from: Address,
        duration: Duration,
    ) -> Result<WriteReceipt, Self::Error> {
        let mut state = self.enter("startElection")?;
        state.ensure_admin(from)?;
        if duration.is_zero() {
            return Err(MockLedgerError::InvalidDuration);
        }
        if state.remaining() > 0 {
            return Err(MockLedgerError::ElectionAlreadyActive);
        }
        state.window_closes_at = Some(Instant::now() + duration);
        state.ended = false;
        Ok(state.next_receipt())
    }

    async fn end_election(&self, from: Address) -> Result<WriteReceipt, Self::Error> {
        let mut state = self.enter("endElection")?;
        state.ensure_admin(from)?;
        state.ended = true;
        state.window_closes_at = None;
        Ok(state.next_receipt())
    }

    async fn vote(&self, from: Address, id: CandidateId) -> Result<WriteReceipt, Self::Error> {
        let mut state = self.enter("vote")?;
        if state.remaining() == 0 {
            return Err(MockLedgerError::ElectionNotActive);
        }
        if state.voters.contains(&from) {
            return Err(MockLedgerError::AlreadyVoted(from));
        }
        let candidate = state
            .candidates
            .get_mut(id as usize)
            .ok_or(MockLedgerError::UnknownCandidate(id))?;
        if !candidate.active {
            return Err(MockLedgerError::CandidateInactive(id));
        }
        candidate.vote_count += 1;
        state.voters.insert(from);
        Ok(state.next_receipt())
    }
}
