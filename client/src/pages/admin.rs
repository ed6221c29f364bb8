//! The admin dashboard.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use votechain_ledger_interface::{
    Address, Candidate, CandidateId, NewCandidate, VotingLedger, WalletProvider, WriteReceipt,
};

use crate::connection::ConnectionContext;
use crate::countdown::{format_time, Countdown};
use crate::error::{read_failed, write_failed, Action, PageError};
use crate::pages::{context_blocker, session, Blocker, LoadState};

/// One row of the dashboard's candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    /// The candidate, deactivated or not.
    pub candidate: Candidate,
    /// Whether the row offers the deactivate control.
    pub can_deactivate: bool,
}

/// The admin dashboard contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    /// The admin account.
    pub account: Address,
    /// Every candidate, in ordinal order.
    pub candidates: Vec<CandidateRow>,
    /// Seconds left on the local countdown.
    pub remaining_secs: u64,
    /// The formatted countdown. Present only while time is left.
    pub time_left: Option<String>,
}

/// What the admin page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminView {
    /// Nothing to show yet.
    Blocked(Blocker),
    /// The active account is not the admin. No controls are offered.
    Unauthorized,
    /// The dashboard.
    Dashboard(Dashboard),
}

/// The admin page view-model.
///
/// While active, the page runs a [`Countdown`] seeded from the last fetch. Deactivating
/// or dropping the page stops it.
#[derive(Debug)]
pub struct AdminPage {
    candidates: Vec<Candidate>,
    countdown: Option<Countdown>,
    default_duration: Duration,
    load: LoadState,
}

impl AdminPage {
    /// Creates a page whose "start election" opens a window of `default_duration`.
    pub fn new(default_duration: Duration) -> Self {
        Self {
            candidates: Vec::new(),
            countdown: None,
            default_duration,
            load: LoadState::default(),
        }
    }

    /// The length of the voting window "start election" opens.
    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }

    /// Seconds left on the local countdown.
    pub fn remaining_secs(&self) -> u64 {
        self.countdown
            .as_ref()
            .map(Countdown::remaining)
            .unwrap_or_default()
    }

    /// The running countdown, if time is left.
    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    /// Stops the countdown. Call when the page goes out of view.
    pub fn deactivate(&mut self) {
        if self.countdown.take().is_some() {
            debug!("Admin countdown stopped");
        }
    }

    /// Reads every candidate and the remaining time, and restarts the countdown.
    pub async fn fetch<P: WalletProvider>(
        &mut self,
        ctx: &ConnectionContext<P>,
    ) -> Result<(), PageError> {
        let (ledger, _) = authorized(ctx)?;
        match read_dashboard(ledger.as_ref()).await {
            Ok((candidates, remaining)) => {
                debug!(
                    candidates = candidates.len(),
                    remaining, "Admin page refreshed"
                );
                self.candidates = candidates;
                self.countdown = (remaining > 0).then(|| Countdown::start(remaining));
                self.load = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                let err = read_failed("admin", err);
                self.load.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Registers a candidate. Every field is required.
    pub async fn add_candidate<P: WalletProvider>(
        &mut self,
        ctx: &mut ConnectionContext<P>,
        candidate: NewCandidate,
    ) -> Result<WriteReceipt, PageError> {
        let (ledger, account) = authorized(ctx)?;
        if let Some(field) = candidate.first_blank_field() {
            return Err(PageError::MissingField(field));
        }
        let name = candidate.name.clone();
        let receipt = ledger
            .add_candidate(account, candidate)
            .await
            .map_err(|err| write_failed(Action::AddCandidate, err))?;
        info!(%name, tx_hash = ?receipt.tx_hash, "Candidate added");
        self.after_write(ctx).await;
        Ok(receipt)
    }

    /// Deactivates the candidate with ordinal `id`.
    pub async fn deactivate_candidate<P: WalletProvider>(
        &mut self,
        ctx: &mut ConnectionContext<P>,
        id: CandidateId,
    ) -> Result<WriteReceipt, PageError> {
        let (ledger, account) = authorized(ctx)?;
        let receipt = ledger
            .deactivate_candidate(account, id)
            .await
            .map_err(|err| write_failed(Action::DeactivateCandidate, err))?;
        info!(candidate = id, tx_hash = ?receipt.tx_hash, "Candidate deactivated");
        self.after_write(ctx).await;
        Ok(receipt)
    }

    /// Opens the voting window for `duration`, or for the page's default duration.
    pub async fn start_election<P: WalletProvider>(
        &mut self,
        ctx: &mut ConnectionContext<P>,
        duration: Option<Duration>,
    ) -> Result<WriteReceipt, PageError> {
        let (ledger, account) = authorized(ctx)?;
        let duration = duration.unwrap_or(self.default_duration);
        let receipt = ledger
            .start_election(account, duration)
            .await
            .map_err(|err| write_failed(Action::StartElection, err))?;
        info!(duration_secs = duration.as_secs(), tx_hash = ?receipt.tx_hash, "Election started");
        self.after_write(ctx).await;
        Ok(receipt)
    }

    /// Closes the voting window.
    pub async fn end_election<P: WalletProvider>(
        &mut self,
        ctx: &mut ConnectionContext<P>,
    ) -> Result<WriteReceipt, PageError> {
        let (ledger, account) = authorized(ctx)?;
        let receipt = ledger
            .end_election(account)
            .await
            .map_err(|err| write_failed(Action::EndElection, err))?;
        info!(tx_hash = ?receipt.tx_hash, "Election ended");
        self.after_write(ctx).await;
        Ok(receipt)
    }

    async fn after_write<P: WalletProvider>(&mut self, ctx: &mut ConnectionContext<P>) {
        // The write was accepted even if the refresh fails; the failure is already logged.
        let _ = self.fetch(ctx).await;
        ctx.refresh().await;
    }

    /// Derives what the page shows.
    pub fn view<P: WalletProvider>(&self, ctx: &ConnectionContext<P>) -> AdminView {
        if let Some(blocker) = context_blocker(ctx) {
            return AdminView::Blocked(blocker);
        }
        let account = match ctx.account() {
            Some(account) if ctx.is_admin() => account,
            _ => return AdminView::Unauthorized,
        };
        if let Some(blocker) = self.load.blocker() {
            return AdminView::Blocked(blocker);
        }
        let remaining_secs = self.remaining_secs();
        AdminView::Dashboard(Dashboard {
            account,
            candidates: self
                .candidates
                .iter()
                .map(|candidate| CandidateRow {
                    candidate: candidate.clone(),
                    can_deactivate: candidate.active,
                })
                .collect(),
            remaining_secs,
            time_left: (remaining_secs > 0).then(|| format_time(remaining_secs)),
        })
    }
}

fn authorized<P: WalletProvider>(
    ctx: &ConnectionContext<P>,
) -> Result<(Arc<P::Ledger>, Address), PageError> {
    let (ledger, account) = session(ctx)?;
    if !ctx.is_admin() {
        return Err(PageError::NotAdmin);
    }
    Ok((ledger, account))
}

async fn read_dashboard<L: VotingLedger>(ledger: &L) -> Result<(Vec<Candidate>, u64), L::Error> {
    let candidates = ledger.candidates().await?;
    let remaining = ledger.remaining_time().await?;
    Ok((candidates, remaining))
}
