use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use votechain_cli::clap::{self, Parser};
use votechain_cli::workflows::pages::run_results;
use votechain_cli::{
    wallet_dir, AdminWorkflow, HomeWorkflow, KeyWorkflow, VoteWorkflow, WalletState,
};
use votechain_client::{from_toml_path, CachingProvider, ClientConfig, ConnectionContext};
use votechain_evm_adapter::{EvmConfig, EvmWalletProvider};
use votechain_ledger_interface::{Address, WalletProvider};

#[derive(clap::Subcommand)]
#[command(author, version, about, long_about = None)]
enum Workflows {
    #[clap(subcommand)]
    Keys(KeyWorkflow),
    Home(HomeWorkflow),
    #[clap(subcommand)]
    Vote(VoteWorkflow),
    /// Show the election results
    Results,
    #[clap(subcommand)]
    Admin(AdminWorkflow),
}

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct App {
    /// Path to the client configuration
    #[arg(long, default_value = "votechain_config.toml")]
    config: PathBuf,
    /// Act as this wallet address instead of the active key
    #[arg(long, global = true)]
    account: Option<Address>,
    #[clap(subcommand)]
    workflow: Workflows,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Unable to set global default subscriber")?;

    let app_dir = wallet_dir()?;
    std::fs::create_dir_all(app_dir.as_ref())?;
    let wallet_state_path = app_dir.as_ref().join("wallet_state.json");
    let mut wallet_state = WalletState::load(&wallet_state_path)?;

    let App {
        config,
        account,
        workflow,
    } = App::parse();
    if let Workflows::Keys(inner) = workflow {
        inner.run(&mut wallet_state, app_dir)?;
        wallet_state.save(wallet_state_path)?;
        return Ok(());
    }

    let config: ClientConfig = from_toml_path(&config)
        .with_context(|| format!("Unable to read the configuration at {}", config.display()))?;
    debug!(?config, "Client configuration loaded");

    let mut evm_config = EvmConfig::new(config.network.rpc_url.clone());
    evm_config.confirmations = config.ledger.confirmations;
    let provider = EvmWalletProvider::new(evm_config, wallet_state.load_wallets()?)?;
    if let Some(account) = account {
        provider.switch_account(account)?;
    }
    info!(network = %config.network.chain_name, "Using network");

    let chain_watcher = provider.spawn_chain_watcher(config.network.poll_interval());
    let result = if config.cache.enabled {
        run(CachingProvider::new(provider), &config, workflow).await
    } else {
        run(provider, &config, workflow).await
    };
    chain_watcher.abort();
    result
}

async fn run<P: WalletProvider>(
    provider: P,
    config: &ClientConfig,
    workflow: Workflows,
) -> Result<(), anyhow::Error> {
    let mut ctx = ConnectionContext::new(
        Some(Arc::new(provider)),
        config.network.chain_id,
        config.ledger.contract_address,
    );
    ctx.refresh().await;

    let mut out = std::io::stdout().lock();
    match workflow {
        Workflows::Keys(_) => anyhow::bail!("Key workflows run without a connection"),
        Workflows::Home(inner) => inner.run(&mut ctx, &mut out).await,
        Workflows::Vote(inner) => inner.run(&mut ctx, &mut out).await,
        Workflows::Results => run_results(&ctx, &mut out).await,
        Workflows::Admin(inner) => {
            inner
                .run(&mut ctx, config.election.default_duration(), &mut out)
                .await
        }
    }
}
