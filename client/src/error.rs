use std::fmt::{self, Display};

use thiserror::Error;
use tracing::error;
use votechain_ledger_interface::CandidateId;

/// Why the connection context could not establish a session.
///
/// The `Display` output is the message shown to the user. Details of remote failures are
/// written to the log instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No wallet provider is installed.
    #[error("Please install a wallet provider to use this app.")]
    ProviderMissing,

    /// The wallet is connected to another chain.
    #[error("Please connect to the correct network (Chain ID: {expected}).")]
    WrongNetwork {
        /// The configured chain id.
        expected: u64,
        /// The wallet's chain id.
        actual: u64,
    },

    /// The wallet authorized no account.
    #[error("No wallet account is connected. Connect an account to continue.")]
    AccountUnavailable,

    /// A remote read failed while establishing the session.
    #[error("Failed to load blockchain data. Check the logs for details.")]
    LoadFailed,
}

/// A user action that writes to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `vote`
    Vote,
    /// `addCandidate`
    AddCandidate,
    /// `deactivateCandidate`
    DeactivateCandidate,
    /// `startElection`
    StartElection,
    /// `endElection`
    EndElection,
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Vote => "Vote",
            Action::AddCandidate => "Add candidate",
            Action::DeactivateCandidate => "Deactivate candidate",
            Action::StartElection => "Start election",
            Action::EndElection => "End election",
        };
        f.write_str(name)
    }
}

/// Failures of page operations. The `Display` output is the alert shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The connection context holds no session.
    #[error("Not connected to the blockchain.")]
    NotConnected,

    /// An admin action was requested by another account.
    #[error("You are not the admin.")]
    NotAdmin,

    /// The account already cast its ballot.
    #[error("You have already voted.")]
    AlreadyVoted,

    /// No voting window is open.
    #[error("The election is not currently active.")]
    ElectionInactive,

    /// The candidate is not on the ballot: unknown or deactivated.
    #[error("Candidate {0} is not on the ballot.")]
    NotOnBallot(CandidateId),

    /// A field of a new candidate is blank.
    #[error("All candidate fields are required ({0} is empty).")]
    MissingField(&'static str),

    /// A page read failed.
    #[error("Failed to load data from the blockchain. Check the logs for details.")]
    ReadFailed,

    /// A ledger write failed or was rejected.
    #[error("{0} failed. Check the logs for details.")]
    WriteFailed(Action),
}

pub(crate) fn read_failed<E: Display>(page: &'static str, err: E) -> PageError {
    error!(page, %err, "Error fetching page data");
    PageError::ReadFailed
}

pub(crate) fn write_failed<E: Display>(action: Action, err: E) -> PageError {
    error!(%action, %err, "Ledger write failed");
    PageError::WriteFailed(action)
}
