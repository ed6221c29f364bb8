//! The standings page.

use std::cmp::Reverse;

use tracing::debug;
use votechain_ledger_interface::{Candidate, VotingLedger, WalletProvider};

use crate::connection::ConnectionContext;
use crate::error::{read_failed, PageError};
use crate::pages::{context_blocker, Blocker, LoadState};

/// Shown while the election is still running.
pub const LIVE_RESULTS_NOTICE: &str =
    "Results are live. The final winner will be declared after the election ends.";

/// A candidate and its 1-based place in the standings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCandidate {
    /// 1-based position.
    pub position: usize,
    /// The candidate.
    pub candidate: Candidate,
}

/// The derived standings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    /// Every candidate, most votes first.
    pub rows: Vec<RankedCandidate>,
    /// The declared winner, once the election ended.
    pub winner: Option<Candidate>,
    /// Whether the election ended.
    pub ended: bool,
}

impl Standings {
    /// The notice shown above the standings, if any.
    pub fn notice(&self) -> Option<&'static str> {
        (!self.ended).then_some(LIVE_RESULTS_NOTICE)
    }
}

/// What the standings page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsView {
    /// Nothing to show yet.
    Blocked(Blocker),
    /// The standings.
    Standings(Standings),
}

/// Orders candidates by descending vote count. Candidates with equal counts keep their
/// relative order, so reading in ordinal order breaks ties by lowest id.
pub fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by_key(|candidate| Reverse(candidate.vote_count));
    candidates
}

/// Derives the standings from candidates read in ordinal order.
pub fn standings(candidates: Vec<Candidate>, ended: bool) -> Standings {
    let ranked = rank(candidates);
    let winner = if ended { ranked.first().cloned() } else { None };
    Standings {
        rows: ranked
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| RankedCandidate {
                position: index + 1,
                candidate,
            })
            .collect(),
        winner,
        ended,
    }
}

/// The standings page view-model.
#[derive(Debug, Default)]
pub struct ResultsPage {
    standings: Option<Standings>,
    load: LoadState,
}

impl ResultsPage {
    /// Creates a page that has not fetched yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every candidate and the ended flag.
    pub async fn fetch<P: WalletProvider>(
        &mut self,
        ctx: &ConnectionContext<P>,
    ) -> Result<(), PageError> {
        let ledger = ctx.ledger().cloned().ok_or(PageError::NotConnected)?;
        match read_standings(ledger.as_ref()).await {
            Ok(standings) => {
                debug!(
                    candidates = standings.rows.len(),
                    ended = standings.ended,
                    "Results page refreshed"
                );
                self.standings = Some(standings);
                self.load = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                let err = read_failed("results", err);
                self.load.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Derives what the page shows.
    pub fn view<P: WalletProvider>(&self, ctx: &ConnectionContext<P>) -> ResultsView {
        if let Some(blocker) = context_blocker(ctx).or_else(|| self.load.blocker()) {
            return ResultsView::Blocked(blocker);
        }
        match &self.standings {
            Some(standings) => ResultsView::Standings(standings.clone()),
            None => ResultsView::Blocked(Blocker::Loading),
        }
    }
}

async fn read_standings<L: VotingLedger>(ledger: &L) -> Result<Standings, L::Error> {
    let candidates = ledger.candidates().await?;
    let ended = ledger.is_election_ended().await?;
    Ok(standings(candidates, ended))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use votechain_ledger_interface::CandidateId;

    use super::*;

    fn candidate(id: CandidateId, vote_count: u64) -> Candidate {
        Candidate {
            id,
            name: format!("candidate-{id}"),
            party: "Independent".to_string(),
            constituency: "Central".to_string(),
            logo_url: String::new(),
            vote_count,
            active: true,
        }
    }

    fn from_counts(counts: &[u64]) -> Vec<Candidate> {
        counts
            .iter()
            .enumerate()
            .map(|(id, count)| candidate(id as CandidateId, *count))
            .collect()
    }

    proptest! {
        #[test]
        fn standings_are_non_increasing_and_the_winner_has_the_most_votes(
            counts in proptest::collection::vec(0u64..20, 1..24),
        ) {
            let standings = standings(from_counts(&counts), true);

            let ordered: Vec<u64> = standings.rows.iter().map(|r| r.candidate.vote_count).collect();
            prop_assert!(ordered.windows(2).all(|pair| pair[0] >= pair[1]));

            let max = *counts.iter().max().unwrap();
            let first_with_max = counts.iter().position(|count| *count == max).unwrap();
            let winner = standings.winner.unwrap();
            prop_assert_eq!(winner.vote_count, max);
            prop_assert_eq!(winner.id, first_with_max as CandidateId);
        }
    }

    #[test]
    fn ended_election_declares_the_top_candidate() {
        let standings = standings(from_counts(&[5, 12, 7]), true);

        let order: Vec<u64> = standings.rows.iter().map(|r| r.candidate.vote_count).collect();
        assert_eq!(order, vec![12, 7, 5]);
        assert_eq!(standings.winner.as_ref().map(|w| w.id), Some(1));
        assert_eq!(
            standings.rows.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(standings.notice(), None);
    }

    #[test]
    fn running_election_has_no_winner() {
        let standings = standings(from_counts(&[5, 12, 7]), false);
        assert_eq!(standings.winner, None);
        assert_eq!(standings.notice(), Some(LIVE_RESULTS_NOTICE));
    }

    #[test]
    fn no_candidates_means_no_winner() {
        let standings = standings(Vec::new(), true);
        assert!(standings.rows.is_empty());
        assert_eq!(standings.winner, None);
    }
}
