//! Axiom V1 query CLI.
//!
//! ```text
//! send-query:
//!     config → SignerStrategy::select (bridge only without a key)
//!     → flow::send_query (assemble, sign, broadcast, release bridge)
//!     → receipt → stdout
//!
//! get-witness:
//!     config → flow::witness_report (tx hash, targets)
//!     → stdout (one JSON line)
//! ```
//!
//! Logs go to stderr, filtered by `RUST_LOG`.

use std::error::Error;
use std::path::PathBuf;

use alloy::primitives::TxHash;
use clap::{Parser, Subcommand};

use axiom_query::blockchain::{BlockchainClient, RpcWalletBridge, SignerStrategy};
use axiom_query::config::{load_config, load_from_env, QueryConfig};
use axiom_query::flow::{self, QuerySubmission};
use axiom_query::observability::init_logging;
use axiom_query::query::demo::DEFAULT_QUERY_BLOCK;
use axiom_query::query::WitnessTarget;
use axiom_query::report;

/// A previously mined `sendQuery` transaction.
const DEFAULT_TX_HASH: &str = "0xc25726722a6940e0bc9e3066a9c59f24f6c8a19db604fb9e2321662f5dc4fa5d";

const DEFAULT_TARGETS: [&str; 2] = [
    "6779167:0x6337b3caf9c5236c7f3d1694410776119edaf9fa:0x8",
    "7778167:0x6337b3caf9c5236c7f3d1694410776119edaf9fa:8",
];

#[derive(Parser)]
#[command(name = "axiom-query")]
#[command(about = "Submit Axiom V1 queries and extract validation witnesses", long_about = None)]
struct Cli {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the demonstration query and send it on-chain
    SendQuery {
        /// First block of the query
        #[arg(short, long, default_value_t = DEFAULT_QUERY_BLOCK)]
        block: u64,
    },
    /// Print storage witnesses for a submitted query
    GetWitness {
        /// `sendQuery` transaction hash
        #[arg(long, default_value = DEFAULT_TX_HASH)]
        tx: TxHash,

        /// Storage slot to extract, as BLOCK:ADDRESS:SLOT (repeatable)
        #[arg(short, long = "target")]
        targets: Vec<WitnessTarget>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env(),
    };
    tracing::info!(
        provider_uri = %config.provider_uri,
        chain_id = config.chain_id,
        mock = config.mock,
        "Configuration loaded"
    );

    match cli.command {
        Commands::SendQuery { block } => send_query(&config, block).await,
        Commands::GetWitness { tx, targets } => {
            let targets = if targets.is_empty() {
                DEFAULT_TARGETS.iter().map(|t| t.parse()).collect::<Result<Vec<_>, _>>()?
            } else {
                targets
            };
            get_witness(&config, tx, &targets).await
        }
    }
}

async fn send_query(config: &QueryConfig, block: u64) -> Result<(), Box<dyn Error>> {
    let strategy =
        SignerStrategy::select(config, || RpcWalletBridge::new(config.wallet_bridge_uri()))?;
    let client = BlockchainClient::new(config).await?;

    let QuerySubmission { query, submitted } =
        flow::send_query(config, &client, &strategy, block).await?;
    report::print_assembled(&query);
    report::print_labeled("tx", submitted.request())?;

    let receipt = submitted.wait().await?;
    report::print_labeled("receipt", &receipt)?;
    Ok(())
}

async fn get_witness(
    config: &QueryConfig,
    tx: TxHash,
    targets: &[WitnessTarget],
) -> Result<(), Box<dyn Error>> {
    let client = BlockchainClient::new(config).await?;
    let witness_report = flow::witness_report(&client, tx, targets, config.mock).await?;
    report::print_json(&witness_report)?;
    Ok(())
}
