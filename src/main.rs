//! Pump.fun multichain launcher
//!
//! # WARNING
//! - Every step spends real funds on mainnet: SOL for the create, buy and
//!   bridge fees, ETH for gas and the WETH seeded into the pool.
//! - Liquidity minted into the pool can be traded against immediately.
//! - Run against `network = "testnet"` first.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use pumpfun_multichain::cli::commands;
use pumpfun_multichain::config::Config;

/// Launch a pump.fun token and list it on Base
#[derive(Parser)]
#[command(name = "launch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "launch.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, attest, bridge and deploy in one go
    Run {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,

        /// Write a JSON report of the run to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Create the token on pump.fun with the initial buy
    Create {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Attest a mint through Wormhole and create its wrapped token on Base
    Attest {
        /// Mint address (default: the persisted mint keypair)
        #[arg(long)]
        mint: Option<String>,
    },

    /// Bridge tokens from the creator to the Base signer
    Bridge {
        /// Mint address (default: the persisted mint keypair)
        #[arg(long)]
        mint: Option<String>,

        /// Raw token units to bridge (default: whole balance)
        #[arg(long)]
        amount: Option<u64>,
    },

    /// Redeem a bridged transfer on Base, e.g. after a failed run
    Redeem {
        /// Wormhole message id as chain/emitter/sequence
        message: String,
    },

    /// Print the Uniswap v3 position ladder without sending anything
    Plan {
        /// Wrapped token address on Base
        #[arg(long)]
        token: String,

        /// Token decimals on Base
        #[arg(long, default_value_t = 6)]
        decimals: u8,
    },

    /// Wrap ETH, create the pool and mint the positions
    Deploy {
        /// Wrapped token address on Base
        #[arg(long)]
        token: String,

        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show the persisted mint, balances and wrapped token
    Status,

    /// Show current configuration (secrets masked)
    Config,

    /// Check Solana RPC, Wormholescan and Base RPC
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pumpfun_multichain=info".parse()?),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Network: {}", config.network);

    let result = match cli.command {
        Commands::Run { yes, report } => commands::run(&config, yes, report.as_deref()).await,
        Commands::Create { yes } => commands::create(&config, yes).await,
        Commands::Attest { mint } => commands::attest(&config, mint.as_deref()).await,
        Commands::Bridge { mint, amount } => {
            commands::bridge(&config, mint.as_deref(), amount).await
        }
        Commands::Redeem { message } => commands::redeem(&config, &message).await,
        Commands::Plan { token, decimals } => commands::plan(&config, &token, decimals),
        Commands::Deploy { token, yes } => commands::deploy(&config, &token, yes).await,
        Commands::Status => commands::status(&config).await,
        Commands::Config => commands::show_config(&config),
        Commands::Health => commands::health(&config).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
