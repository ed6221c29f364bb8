//! The ballot page.

use tracing::{debug, info};
use votechain_ledger_interface::{
    Address, Candidate, CandidateId, VotingLedger, WalletProvider, WriteReceipt,
};

use crate::connection::ConnectionContext;
use crate::error::{read_failed, write_failed, Action, PageError};
use crate::pages::{context_blocker, session, Blocker, LoadState};

/// Shown after a ballot was accepted.
pub const VOTE_SUCCESS: &str = "Vote cast successfully!";

/// The vote button of one ballot entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteAction {
    /// Whether the button can be pressed.
    pub enabled: bool,
    /// The button label.
    pub label: &'static str,
}

/// One candidate on the ballot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallotEntry {
    /// The candidate.
    pub candidate: Candidate,
    /// Its vote button.
    pub action: VoteAction,
}

/// What the ballot page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteView {
    /// Nothing to show yet.
    Blocked(Blocker),
    /// No voting window is open.
    ElectionInactive,
    /// The ballot. Empty when no candidate is active.
    Ballot(Vec<BallotEntry>),
}

/// Builds the ballot: active candidates only, in ordinal order, every button disabled
/// once the account has voted.
pub fn ballot(candidates: &[Candidate], has_voted: bool) -> Vec<BallotEntry> {
    let action = if has_voted {
        VoteAction {
            enabled: false,
            label: "Voted",
        }
    } else {
        VoteAction {
            enabled: true,
            label: "Vote",
        }
    };
    candidates
        .iter()
        .filter(|candidate| candidate.active)
        .map(|candidate| BallotEntry {
            candidate: candidate.clone(),
            action,
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    candidates: Vec<Candidate>,
    has_voted: bool,
    election_active: bool,
}

/// The ballot page view-model.
#[derive(Debug, Default)]
pub struct VotePage {
    snapshot: Snapshot,
    load: LoadState,
}

impl VotePage {
    /// Creates a page that has not fetched yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the active account already voted, as of the last fetch.
    pub fn has_voted(&self) -> bool {
        self.snapshot.has_voted
    }

    /// Reads the candidates, the account's voter flag and the remaining time.
    pub async fn fetch<P: WalletProvider>(
        &mut self,
        ctx: &ConnectionContext<P>,
    ) -> Result<(), PageError> {
        let (ledger, account) = session(ctx)?;
        match read_snapshot(ledger.as_ref(), account).await {
            Ok(snapshot) => {
                debug!(
                    candidates = snapshot.candidates.len(),
                    has_voted = snapshot.has_voted,
                    election_active = snapshot.election_active,
                    "Vote page refreshed"
                );
                self.snapshot = snapshot;
                self.load = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                let err = read_failed("vote", err);
                self.load.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Casts the active account's ballot for `id`, then refreshes the page and the
    /// connection context.
    ///
    /// Only a vote the ballot offers a button for is sent, as of the last fetch: the
    /// account has not voted, the election is active and `id` is on the ballot.
    pub async fn cast_vote<P: WalletProvider>(
        &mut self,
        ctx: &mut ConnectionContext<P>,
        id: CandidateId,
    ) -> Result<WriteReceipt, PageError> {
        let (ledger, account) = session(ctx)?;
        if self.snapshot.has_voted {
            return Err(PageError::AlreadyVoted);
        }
        if !self.snapshot.election_active {
            return Err(PageError::ElectionInactive);
        }
        if !self.is_on_ballot(id) {
            return Err(PageError::NotOnBallot(id));
        }
        let receipt = ledger
            .vote(account, id)
            .await
            .map_err(|err| write_failed(Action::Vote, err))?;
        info!(candidate = id, tx_hash = ?receipt.tx_hash, "Vote cast");
        self.snapshot.has_voted = true;

        // The ballot was accepted even if the refresh fails; the failure is already logged.
        let _ = self.fetch(ctx).await;
        ctx.refresh().await;
        Ok(receipt)
    }

    fn is_on_ballot(&self, id: CandidateId) -> bool {
        self.snapshot
            .candidates
            .iter()
            .any(|candidate| candidate.id == id && candidate.active)
    }

    /// Derives what the page shows.
    pub fn view<P: WalletProvider>(&self, ctx: &ConnectionContext<P>) -> VoteView {
        if let Some(blocker) = context_blocker(ctx).or_else(|| self.load.blocker()) {
            return VoteView::Blocked(blocker);
        }
        if !self.snapshot.election_active {
            return VoteView::ElectionInactive;
        }
        VoteView::Ballot(ballot(&self.snapshot.candidates, self.snapshot.has_voted))
    }
}

async fn read_snapshot<L: VotingLedger>(
    ledger: &L,
    account: Address,
) -> Result<Snapshot, L::Error> {
    let candidates = ledger.candidates().await?;
    let has_voted = ledger.has_voted(account).await?;
    let remaining = ledger.remaining_time().await?;
    Ok(Snapshot {
        candidates,
        has_voted,
        election_active: remaining > 0,
    })
}
