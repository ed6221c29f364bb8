//! Plain data exchanged with the voting contract.
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// A 20-byte account or contract address.
///
/// Addresses are compared as bytes, so two hex renderings which only differ in case
/// (for example a checksummed and a lowercase one) name the same account.
pub type Address = ethereum_types::H160;

/// The hash of a submitted transaction.
pub type TxHash = ethereum_types::H256;

/// The ordinal index the ledger assigned to a candidate at registration.
pub type CandidateId = u64;

/// A candidate record as stored by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Ordinal id, assigned in registration order starting at zero.
    pub id: CandidateId,
    /// Display name.
    pub name: String,
    /// Party label.
    pub party: String,
    /// Constituency label.
    pub constituency: String,
    /// Logo image url.
    pub logo_url: String,
    /// Number of ballots cast for this candidate.
    pub vote_count: u64,
    /// Cleared when the admin deactivates the candidate. Candidates are never deleted.
    pub active: bool,
}

/// The fields an admin supplies when registering a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    /// Display name.
    pub name: String,
    /// Party label.
    pub party: String,
    /// Constituency label.
    pub constituency: String,
    /// Logo image url.
    pub logo_url: String,
}

impl NewCandidate {
    /// Returns the name of the first field that is empty or only whitespace.
    pub fn first_blank_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("party", &self.party),
            ("constituency", &self.constituency),
            ("logo_url", &self.logo_url),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

/// The phase of the election, derived from the ledger's remaining time and ended flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectionPhase {
    /// No election window is open and none has been closed.
    NotStarted,
    /// Ballots are accepted.
    Active,
    /// The election window was closed, either by timeout or by the admin.
    Ended,
}

impl ElectionPhase {
    /// Derives the phase from the two values the ledger reports.
    pub fn from_ledger(remaining_secs: u64, ended: bool) -> Self {
        if ended {
            ElectionPhase::Ended
        } else if remaining_secs > 0 {
            ElectionPhase::Active
        } else {
            ElectionPhase::NotStarted
        }
    }

    /// True while ballots are accepted.
    pub fn is_active(&self) -> bool {
        matches!(self, ElectionPhase::Active)
    }
}

impl Display for ElectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElectionPhase::NotStarted => f.write_str("not started"),
            ElectionPhase::Active => f.write_str("active"),
            ElectionPhase::Ended => f.write_str("ended"),
        }
    }
}

/// Proof that a write was accepted by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    /// The hash of the confirmed transaction.
    pub tx_hash: TxHash,
}

/// A notification emitted by the wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The set of authorized accounts changed. The first entry is the active account.
    /// An empty list means the user disconnected every account.
    AccountsChanged(Vec<Address>),
    /// The provider switched to another chain.
    ChainChanged(u64),
}
