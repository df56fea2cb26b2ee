use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use ethers::types::U256;
use paylock_client::interface::{load_config, EscrowConfig};
use paylock_client::EscrowClient;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EscrowConfig::default(),
    };
    if cli.escrow_contract.is_some() {
        config.escrow_contract = cli.escrow_contract;
    }
    let client = EscrowClient::connect(&config, &cli.private_key).await?;
    tracing::info!(address = ?client.address(), "Client ready");

    match cli.command {
        Commands::Approve { amount } => print_json(&client.approve_spend(&amount).await?)?,
        Commands::Create {
            provider,
            amount,
            duration,
        } => print_json(&client.create_escrow(&provider, &amount, duration).await?)?,
        Commands::Complete { escrow_id } => {
            print_json(&client.complete_escrow(escrow_id.into()).await?)?
        }
        Commands::Dispute { escrow_id } => {
            print_json(&client.raise_dispute(escrow_id.into()).await?)?
        }
        Commands::Escrow { escrow_id } => {
            print_json(&client.get_escrow(U256::from(escrow_id)).await?)?
        }
        Commands::Reputation { address } => {
            let score = client.get_reputation(&address).await?;
            println!("{score}");
        }
        Commands::Allowance => {
            let allowance = client.allowance().await?;
            println!("{allowance}");
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Parser)]
#[command(name = "paylock")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with `rpc_url`, `escrow_contract` and `token_contract`
    #[arg(short, long, value_parser, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Escrow contract address, overriding the config file
    #[arg(long, env = "PAYLOCK_ESCROW_CONTRACT")]
    escrow_contract: Option<String>,

    /// Hex-encoded signing key
    #[arg(long, env = "PAYLOCK_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Approve the escrow contract to spend tokens
    Approve {
        #[arg(short, long)]
        amount: String,
    },
    /// Lock tokens for a provider
    Create {
        #[arg(short, long)]
        provider: String,

        #[arg(short, long)]
        amount: String,

        /// Seconds until the deadline
        #[arg(short, long)]
        duration: u64,
    },
    /// Release an escrow to its provider
    Complete { escrow_id: u64 },
    /// Flag an escrow as disputed
    Dispute { escrow_id: u64 },
    /// Show an escrow's on-chain state
    Escrow { escrow_id: u64 },
    /// Show the reputation score of an address
    Reputation { address: String },
    /// Show the allowance granted to the escrow contract
    Allowance,
}
