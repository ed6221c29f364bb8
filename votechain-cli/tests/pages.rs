use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use votechain_cli::workflows::pages::{run_results, RELOAD_NOTICE};
use votechain_cli::{AdminWorkflow, HomeWorkflow, VoteWorkflow};
use votechain_client::ConnectionContext;
use votechain_ledger_interface::mocks::{MockLedger, MockWalletProvider};
use votechain_ledger_interface::Address;

const SEPOLIA: u64 = 11155111;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn contract() -> Address {
    Address::from_str("0xFD953Ef6Fa10D7fe03454329A8448Fa318Ad229A").unwrap()
}

fn admin() -> Address {
    Address::from_str("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap()
}

fn voter() -> Address {
    Address::from_low_u64_be(0xbeef)
}

async fn connected(
    ledger: &MockLedger,
    account: Address,
) -> ConnectionContext<MockWalletProvider> {
    let provider = MockWalletProvider::new(SEPOLIA, ledger.clone()).with_accounts(vec![account]);
    let mut ctx = ConnectionContext::new(Some(Arc::new(provider)), SEPOLIA, contract());
    ctx.refresh().await;
    ctx
}

fn printed(out: Vec<u8>) -> String {
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn home_shows_the_connected_account() {
    let ctx = &mut connected(&MockLedger::new(admin()), voter()).await;
    let mut out = Vec::new();

    HomeWorkflow { connect: false }
        .run(ctx, &mut out)
        .await
        .unwrap();

    let out = printed(out);
    assert!(out.starts_with("Welcome to VoteChain\n"));
    assert!(out.contains(&format!("Connected Account: {:?}", voter())));
}

#[tokio::test]
async fn home_reports_the_wrong_network() {
    let provider =
        MockWalletProvider::new(1, MockLedger::new(admin())).with_accounts(vec![voter()]);
    let mut ctx = ConnectionContext::new(Some(Arc::new(provider)), SEPOLIA, contract());
    ctx.refresh().await;
    let mut out = Vec::new();

    HomeWorkflow { connect: false }
        .run(&mut ctx, &mut out)
        .await
        .unwrap();

    let out = printed(out);
    assert!(out.contains("No wallet connected."));
    assert!(out.contains("Please connect to the correct network (Chain ID: 11155111)."));
}

#[tokio::test]
async fn casting_a_vote_prints_the_confirmation_and_the_updated_ballot() {
    let ledger = MockLedger::new(admin());
    ledger.seed_candidate("Alice", 0, true);
    ledger.seed_candidate("Bob", 0, true);
    ledger.seed_open_window(DAY);
    let ctx = &mut connected(&ledger, voter()).await;
    let mut out = Vec::new();

    VoteWorkflow::Cast { id: 1 }
        .run(ctx, &mut out)
        .await
        .unwrap();

    let out = printed(out);
    assert!(out.starts_with("Vote cast successfully! (tx 0x"));
    assert!(out.contains("Vote for Your Candidate\n"));
    assert!(out.contains("[1] Bob | Party: Bob Party | Constituency: Central | Voted\n"));
    assert_eq!(ledger.snapshot()[1].vote_count, 1);
}

#[tokio::test]
async fn a_second_vote_is_refused_without_failing_the_command() {
    let ledger = MockLedger::new(admin());
    ledger.seed_candidate("Alice", 3, true);
    ledger.seed_open_window(DAY);
    ledger.seed_voter(voter());
    let ctx = &mut connected(&ledger, voter()).await;
    let mut out = Vec::new();

    VoteWorkflow::Cast { id: 0 }
        .run(ctx, &mut out)
        .await
        .unwrap();

    assert!(printed(out).starts_with("You have already voted.\n"));
    assert_eq!(ledger.snapshot()[0].vote_count, 3);
}

#[tokio::test]
async fn the_ballot_is_closed_outside_the_voting_window() {
    let ledger = MockLedger::new(admin());
    ledger.seed_candidate("Alice", 0, true);
    let ctx = &mut connected(&ledger, voter()).await;
    let mut out = Vec::new();

    VoteWorkflow::List.run(ctx, &mut out).await.unwrap();

    assert_eq!(printed(out), "The election is not currently active.\n");
}

#[tokio::test]
async fn results_name_the_winner_once_the_election_ended() {
    let ledger = MockLedger::new(admin());
    ledger.seed_candidate("Alice", 5, true);
    ledger.seed_candidate("Bob", 12, true);
    ledger.seed_candidate("Carol", 7, true);
    ledger.seed_ended();
    let ctx = connected(&ledger, voter()).await;
    let mut out = Vec::new();

    run_results(&ctx, &mut out).await.unwrap();

    assert_eq!(
        printed(out),
        "Voting Results\n\
         Election Winner: Bob (Bob Party) with 12 votes\n\
         1. Bob (Bob Party) - 12 votes\n\
         2. Carol (Carol Party) - 7 votes\n\
         3. Alice (Alice Party) - 5 votes\n"
    );
}

#[tokio::test]
async fn admin_commands_are_refused_for_other_accounts() {
    let ledger = MockLedger::new(admin());
    let ctx = &mut connected(&ledger, voter()).await;
    ledger.clear_calls();
    let mut out = Vec::new();

    AdminWorkflow::End
        .run(ctx, DAY, &mut out)
        .await
        .unwrap();

    assert_eq!(printed(out), "You are not the admin.\nYou are not the admin.\n");
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn admin_adds_a_candidate() {
    let ledger = MockLedger::new(admin());
    let ctx = &mut connected(&ledger, admin()).await;
    let mut out = Vec::new();

    AdminWorkflow::AddCandidate {
        name: "Alice".to_string(),
        party: "Green".to_string(),
        constituency: "North".to_string(),
        logo_url: "https://example.com/logo.png".to_string(),
    }
    .run(ctx, DAY, &mut out)
    .await
    .unwrap();

    let out = printed(out);
    assert!(out.starts_with("Transaction confirmed. (tx 0x"));
    assert!(out.contains(&format!("Admin Account: {:?}", admin())));
    assert!(out.contains("[0] Alice | Party: Green | Constituency: North | Votes: 0\n"));
    assert_eq!(ledger.snapshot().len(), 1);
}

#[tokio::test]
async fn admin_rejects_blank_fields_before_sending() {
    let ledger = MockLedger::new(admin());
    let ctx = &mut connected(&ledger, admin()).await;
    let mut out = Vec::new();

    AdminWorkflow::AddCandidate {
        name: "Alice".to_string(),
        party: "Green".to_string(),
        constituency: "  ".to_string(),
        logo_url: "https://example.com/logo.png".to_string(),
    }
    .run(ctx, DAY, &mut out)
    .await
    .unwrap();

    assert!(printed(out)
        .starts_with("All candidate fields are required (constituency is empty).\n"));
    assert!(ledger.snapshot().is_empty());
}

#[tokio::test]
async fn admin_deactivation_is_shown_on_the_dashboard() {
    let ledger = MockLedger::new(admin());
    ledger.seed_candidate("Alice", 2, true);
    let ctx = &mut connected(&ledger, admin()).await;
    let mut out = Vec::new();

    AdminWorkflow::Deactivate { id: 0 }
        .run(ctx, DAY, &mut out)
        .await
        .unwrap();

    assert!(printed(out).contains(
        "[0] Alice | Party: Alice Party | Constituency: Central (Deactivated) | Votes: 2\n"
    ));
    assert!(!ledger.snapshot()[0].active);
}

#[tokio::test(start_paused = true)]
async fn admin_starts_the_election_with_the_configured_duration() {
    let ledger = MockLedger::new(admin());
    let ctx = &mut connected(&ledger, admin()).await;
    let mut out = Vec::new();

    AdminWorkflow::Start {
        duration_secs: None,
    }
    .run(ctx, Duration::from_secs(90), &mut out)
    .await
    .unwrap();

    assert!(printed(out).contains("Time Left: 0h 1m 30s\n"));
}

#[tokio::test]
async fn watching_without_a_running_election_returns_at_once() {
    let ledger = MockLedger::new(admin());
    let ctx = &mut connected(&ledger, admin()).await;
    let mut out = Vec::new();

    AdminWorkflow::Watch
        .run(ctx, DAY, &mut out)
        .await
        .unwrap();

    assert!(printed(out).ends_with("The election is not running.\n"));
}

async fn watched_by_admin(
    window: Duration,
) -> (MockWalletProvider, ConnectionContext<MockWalletProvider>) {
    let ledger = MockLedger::new(admin());
    ledger.seed_candidate("Alice", 0, true);
    ledger.seed_open_window(window);
    let provider = MockWalletProvider::new(SEPOLIA, ledger).with_accounts(vec![admin()]);
    let mut ctx = ConnectionContext::new(Some(Arc::new(provider.clone())), SEPOLIA, contract());
    ctx.refresh().await;
    (provider, ctx)
}

#[tokio::test(start_paused = true)]
async fn watching_follows_the_countdown_to_the_end() {
    let (_, mut ctx) = watched_by_admin(Duration::from_secs(2)).await;
    let mut out = Vec::new();

    AdminWorkflow::Watch
        .run(&mut ctx, DAY, &mut out)
        .await
        .unwrap();

    let out = printed(out);
    assert!(out.contains("Time Left: 0h 0m 2s\n"));
    assert!(out.ends_with("Time Left: 0h 0m 1s\nTime Left: Election ended\n"));
}

#[tokio::test(start_paused = true)]
async fn watching_stops_when_the_network_changes() {
    let (provider, mut ctx) = watched_by_admin(Duration::from_secs(3)).await;
    let mut out = Vec::new();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        provider.change_chain(1);
    });

    AdminWorkflow::Watch
        .run(&mut ctx, DAY, &mut out)
        .await
        .unwrap();

    let out = printed(out);
    assert!(out.contains("Time Left: 0h 0m 2s\n"));
    assert!(out.ends_with(&format!("{RELOAD_NOTICE}\n")));
    assert!(!out.contains("Election ended"));
    assert!(ctx.ledger().is_none());
}

#[tokio::test(start_paused = true)]
async fn watching_stops_when_the_account_is_no_longer_admin() {
    let (provider, mut ctx) = watched_by_admin(Duration::from_secs(3)).await;
    let mut out = Vec::new();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        provider.change_accounts(vec![voter()]);
    });

    AdminWorkflow::Watch
        .run(&mut ctx, DAY, &mut out)
        .await
        .unwrap();

    let out = printed(out);
    assert!(out.ends_with("Time Left: 0h 0m 2s\nYou are not the admin.\n"));
    assert_eq!(ctx.account(), Some(voter()));
}
