//! Workflows that drive the client pages and print what they show
use std::fmt::Write as _;
use std::io::Write;
use std::time::Duration;

use tracing::debug;
use votechain_client::countdown::format_time;
use votechain_client::pages::admin::{AdminPage, AdminView, Dashboard};
use votechain_client::pages::home::{self, HomeView};
use votechain_client::pages::results::{ResultsPage, ResultsView, Standings};
use votechain_client::pages::vote::{VotePage, VoteView, VOTE_SUCCESS};
use votechain_client::pages::Blocker;
use votechain_client::{ConnectionContext, EventOutcome, PageError};
use votechain_ledger_interface::{
    Candidate, CandidateId, NewCandidate, WalletProvider, WriteReceipt,
};

/// Printed when the wallet moved to another network during a long-running command.
pub const RELOAD_NOTICE: &str = "The wallet switched networks. Run the command again to reconnect.";

/// Show the landing page
#[derive(Debug, clap::Args)]
pub struct HomeWorkflow {
    /// Ask the wallet to authorize an account first
    #[clap(long, default_value_t = false)]
    pub connect: bool,
}

impl HomeWorkflow {
    /// Run the home workflow
    pub async fn run<P: WalletProvider>(
        self,
        ctx: &mut ConnectionContext<P>,
        out: &mut impl Write,
    ) -> Result<(), anyhow::Error> {
        if self.connect {
            if let Err(err) = home::connect_wallet(ctx).await {
                debug!(%err, "Wallet connection failed");
            }
        }
        write!(out, "{}", render_home(&home::view(ctx)))?;
        Ok(())
    }
}

#[derive(Debug, clap::Subcommand)]
/// View the ballot and cast a vote
pub enum VoteWorkflow {
    /// Show the ballot
    List,
    /// Vote for the candidate with the given id
    Cast {
        /// The candidate id
        id: CandidateId,
    },
}

impl VoteWorkflow {
    /// Run the vote workflow
    pub async fn run<P: WalletProvider>(
        self,
        ctx: &mut ConnectionContext<P>,
        out: &mut impl Write,
    ) -> Result<(), anyhow::Error> {
        let mut page = VotePage::new();
        fetch_logged(page.fetch(ctx).await);
        if let VoteWorkflow::Cast { id } = self {
            match page.cast_vote(ctx, id).await {
                Ok(receipt) => writeln!(out, "{}", confirmation(VOTE_SUCCESS, &receipt))?,
                Err(err) => writeln!(out, "{err}")?,
            }
        }
        write!(out, "{}", render_vote(&page.view(ctx)))?;
        Ok(())
    }
}

/// Show the standings
pub async fn run_results<P: WalletProvider>(
    ctx: &ConnectionContext<P>,
    out: &mut impl Write,
) -> Result<(), anyhow::Error> {
    let mut page = ResultsPage::new();
    fetch_logged(page.fetch(ctx).await);
    write!(out, "{}", render_results(&page.view(ctx)))?;
    Ok(())
}

#[derive(Debug, clap::Subcommand)]
/// Administer the election. Only the admin account can use these.
pub enum AdminWorkflow {
    /// Show the admin dashboard
    Show,
    /// Register a new candidate
    AddCandidate {
        #[clap(long)]
        /// The candidate's name
        name: String,
        #[clap(long)]
        /// The candidate's party
        party: String,
        #[clap(long)]
        /// The constituency the candidate runs in
        constituency: String,
        #[clap(long)]
        /// A URL of the party logo
        logo_url: String,
    },
    /// Deactivate the candidate with the given id
    Deactivate {
        /// The candidate id
        id: CandidateId,
    },
    /// Open the voting window
    Start {
        #[clap(long)]
        /// Length of the voting window in seconds (default: from the config)
        duration_secs: Option<u64>,
    },
    /// Close the voting window now
    End,
    /// Show the dashboard and follow the countdown until it ends or Ctrl-C is pressed.
    /// Account changes re-render the dashboard; a network change ends the watch.
    Watch,
}

impl AdminWorkflow {
    /// Run the admin workflow. `default_duration` is the window "start" opens without
    /// an explicit duration.
    pub async fn run<P: WalletProvider>(
        self,
        ctx: &mut ConnectionContext<P>,
        default_duration: Duration,
        out: &mut impl Write,
    ) -> Result<(), anyhow::Error> {
        let mut page = AdminPage::new(default_duration);
        fetch_logged(page.fetch(ctx).await);

        let result = match self {
            AdminWorkflow::Show => None,
            AdminWorkflow::AddCandidate {
                name,
                party,
                constituency,
                logo_url,
            } => {
                let candidate = NewCandidate {
                    name,
                    party,
                    constituency,
                    logo_url,
                };
                Some(page.add_candidate(ctx, candidate).await)
            }
            AdminWorkflow::Deactivate { id } => Some(page.deactivate_candidate(ctx, id).await),
            AdminWorkflow::Start { duration_secs } => {
                let duration = duration_secs.map(Duration::from_secs);
                Some(page.start_election(ctx, duration).await)
            }
            AdminWorkflow::End => Some(page.end_election(ctx).await),
            AdminWorkflow::Watch => {
                write!(out, "{}", render_admin(&page.view(ctx)))?;
                watch(&mut page, ctx, out).await?;
                page.deactivate();
                return Ok(());
            }
        };

        match result {
            Some(Ok(receipt)) => {
                writeln!(out, "{}", confirmation("Transaction confirmed.", &receipt))?
            }
            Some(Err(err)) => writeln!(out, "{err}")?,
            None => {}
        }
        write!(out, "{}", render_admin(&page.view(ctx)))?;
        page.deactivate();
        Ok(())
    }
}

/// Follows the countdown and the wallet until the countdown ends, Ctrl-C is pressed, or
/// the session stops being an admin session.
async fn watch<P: WalletProvider>(
    page: &mut AdminPage,
    ctx: &mut ConnectionContext<P>,
    out: &mut impl Write,
) -> Result<(), anyhow::Error> {
    let (Some(countdown), Some(provider)) = (page.countdown(), ctx.provider()) else {
        writeln!(out, "The election is not running.")?;
        return Ok(());
    };
    let mut ticks = countdown.subscribe();
    let mut events = provider.subscribe();
    let mut provider_open = true;
    loop {
        tokio::select! {
            changed = ticks.changed() => {
                if changed.is_err() {
                    break;
                }
                let remaining = *ticks.borrow_and_update();
                writeln!(out, "Time Left: {}", format_time(remaining))?;
                out.flush()?;
                if remaining == 0 {
                    break;
                }
            }
            outcome = ctx.next_event(&mut events), if provider_open => match outcome {
                None => provider_open = false,
                Some(EventOutcome::ReloadRequired) => {
                    writeln!(out, "{RELOAD_NOTICE}")?;
                    break;
                }
                Some(_) => {
                    fetch_logged(page.fetch(ctx).await);
                    let view = page.view(ctx);
                    write!(out, "{}", render_admin(&view))?;
                    match (&view, page.countdown()) {
                        (AdminView::Dashboard(_), Some(countdown)) => {
                            ticks = countdown.subscribe();
                        }
                        _ => break,
                    }
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn fetch_logged(result: Result<(), PageError>) {
    if let Err(err) = result {
        debug!(%err, "Page fetch failed");
    }
}

fn confirmation(message: &str, receipt: &WriteReceipt) -> String {
    format!("{message} (tx {:?})", receipt.tx_hash)
}

fn blocker_message(blocker: &Blocker, loading: &str) -> String {
    match blocker {
        Blocker::Loading => loading.to_string(),
        other => other.message(),
    }
}

fn describe(candidate: &Candidate) -> String {
    format!(
        "[{}] {} | Party: {} | Constituency: {}",
        candidate.id, candidate.name, candidate.party, candidate.constituency
    )
}

/// Renders the landing page.
pub fn render_home(view: &HomeView) -> String {
    let mut text = String::from("Welcome to VoteChain\n");
    match view.account {
        Some(account) => {
            let _ = writeln!(text, "Connected Account: {:?}", account);
        }
        None => text.push_str("No wallet connected. Run `home --connect` to connect.\n"),
    }
    if let Some(error) = &view.error {
        let _ = writeln!(text, "{error}");
    }
    if view.can_cast_vote {
        text.push_str("Cast your vote with `vote list` and `vote cast <id>`.\n");
    }
    text
}

/// Renders the ballot page.
pub fn render_vote(view: &VoteView) -> String {
    match view {
        VoteView::Blocked(blocker) => {
            format!("{}\n", blocker_message(blocker, "Loading voting session..."))
        }
        VoteView::ElectionInactive => "The election is not currently active.\n".to_string(),
        VoteView::Ballot(entries) if entries.is_empty() => {
            "No active candidates found.\n".to_string()
        }
        VoteView::Ballot(entries) => {
            let mut text = String::from("Vote for Your Candidate\n");
            for entry in entries {
                let _ = writeln!(
                    text,
                    "{} | {}",
                    describe(&entry.candidate),
                    entry.action.label
                );
            }
            text
        }
    }
}

/// Renders the standings page.
pub fn render_results(view: &ResultsView) -> String {
    match view {
        ResultsView::Blocked(blocker) => {
            format!("{}\n", blocker_message(blocker, "Loading results..."))
        }
        ResultsView::Standings(standings) => render_standings(standings),
    }
}

fn render_standings(standings: &Standings) -> String {
    let mut text = String::from("Voting Results\n");
    if let Some(winner) = &standings.winner {
        let _ = writeln!(
            text,
            "Election Winner: {} ({}) with {} votes",
            winner.name, winner.party, winner.vote_count
        );
    }
    if let Some(notice) = standings.notice() {
        let _ = writeln!(text, "{notice}");
    }
    for row in &standings.rows {
        let name = if row.candidate.name.is_empty() {
            "Unnamed Candidate"
        } else {
            row.candidate.name.as_str()
        };
        let _ = writeln!(
            text,
            "{}. {} ({}) - {} votes",
            row.position, name, row.candidate.party, row.candidate.vote_count
        );
    }
    text
}

/// Renders the admin page.
pub fn render_admin(view: &AdminView) -> String {
    match view {
        AdminView::Blocked(blocker) => {
            format!("{}\n", blocker_message(blocker, "Loading admin data..."))
        }
        AdminView::Unauthorized => format!("{}\n", PageError::NotAdmin),
        AdminView::Dashboard(dashboard) => render_dashboard(dashboard),
    }
}

fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut text = String::from("Admin Dashboard\n");
    let _ = writeln!(text, "Admin Account: {:?}", dashboard.account);
    if let Some(time_left) = &dashboard.time_left {
        let _ = writeln!(text, "Time Left: {time_left}");
    }
    text.push_str("Candidates List\n");
    for row in &dashboard.candidates {
        let status = if row.can_deactivate {
            ""
        } else {
            " (Deactivated)"
        };
        let _ = writeln!(
            text,
            "{}{} | Votes: {}",
            describe(&row.candidate),
            status,
            row.candidate.vote_count
        );
    }
    text
}

#[cfg(test)]
mod tests {
    use votechain_client::pages::results::standings;
    use votechain_client::pages::vote::ballot;
    use votechain_ledger_interface::Address;

    use super::*;

    fn candidate(id: CandidateId, name: &str, vote_count: u64, active: bool) -> Candidate {
        Candidate {
            id,
            name: name.to_string(),
            party: format!("{name} Party"),
            constituency: "Central".to_string(),
            logo_url: String::new(),
            vote_count,
            active,
        }
    }

    #[test]
    fn ballot_rows_carry_the_button_label() {
        let candidates = vec![candidate(0, "Alice", 0, true), candidate(1, "Bob", 0, false)];

        let text = render_vote(&VoteView::Ballot(ballot(&candidates, true)));

        assert_eq!(
            text,
            "Vote for Your Candidate\n\
             [0] Alice | Party: Alice Party | Constituency: Central | Voted\n"
        );
    }

    #[test]
    fn pages_name_what_they_are_loading() {
        assert_eq!(
            render_vote(&VoteView::Blocked(Blocker::Loading)),
            "Loading voting session...\n"
        );
        assert_eq!(
            render_results(&ResultsView::Blocked(Blocker::Connecting)),
            "Connecting to blockchain...\n"
        );
        assert_eq!(
            render_admin(&AdminView::Unauthorized),
            "You are not the admin.\n"
        );
    }

    #[test]
    fn standings_list_the_winner_first() {
        let candidates = vec![
            candidate(0, "Alice", 5, true),
            candidate(1, "Bob", 12, true),
            candidate(2, "", 7, true),
        ];

        let text = render_results(&ResultsView::Standings(standings(candidates, true)));

        assert_eq!(
            text,
            "Voting Results\n\
             Election Winner: Bob (Bob Party) with 12 votes\n\
             1. Bob (Bob Party) - 12 votes\n\
             2. Unnamed Candidate ( Party) - 7 votes\n\
             3. Alice (Alice Party) - 5 votes\n"
        );
    }

    #[test]
    fn dashboard_marks_deactivated_candidates() {
        let dashboard = Dashboard {
            account: Address::from_low_u64_be(1),
            candidates: vec![votechain_client::pages::admin::CandidateRow {
                candidate: candidate(0, "Alice", 3, false),
                can_deactivate: false,
            }],
            remaining_secs: 90,
            time_left: Some("0h 1m 30s".to_string()),
        };

        let text = render_admin(&AdminView::Dashboard(dashboard));

        assert!(text.contains("Time Left: 0h 1m 30s\n"));
        assert!(text.contains(
            "[0] Alice | Party: Alice Party | Constituency: Central (Deactivated) | Votes: 3\n"
        ));
    }
}
