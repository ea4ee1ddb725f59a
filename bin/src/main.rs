//! taxalpha CLI binary.
//!
//! Drives the risk model, tax-loss harvesting, and rebalance pipeline
//! from a JSON scenario fixture (see [`scenario::Scenario`]).

mod cmd;
mod pipeline;
mod scenario;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "taxalpha")]
#[command(about = "Tax-aware portfolio construction engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the risk model up to a month-end and print a summary.
    RiskBuild {
        /// Path to a scenario JSON fixture.
        scenario: PathBuf,

        /// Month-end to build through (YYYY-MM-DD).
        #[arg(long)]
        month_end: String,

        /// Optional TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score tax-loss harvesting opportunities for the scenario's account.
    Harvest {
        /// Path to a scenario JSON fixture.
        scenario: PathBuf,

        /// Date to evaluate opportunities as of (YYYY-MM-DD).
        #[arg(long = "as-of")]
        as_of: String,

        /// Optional TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Solve a tax-aware rebalance for the scenario's account.
    Rebalance {
        /// Path to a scenario JSON fixture.
        scenario: PathBuf,

        /// Rebalance date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        /// Optional TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the risk model, harvesting, and rebalance stages end to end.
    Pipeline {
        /// Path to a scenario JSON fixture.
        scenario: PathBuf,

        /// Rebalance date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        /// Optional TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory to export the resulting rebalancing event to.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::RiskBuild { scenario, month_end, config } => {
            let month_end = parse_date(&month_end)?;
            cmd::risk_build::run(&scenario, month_end, config.as_deref()).await?;
        }
        Commands::Harvest { scenario, as_of, config } => {
            let as_of = parse_date(&as_of)?;
            cmd::harvest::run(&scenario, as_of, config.as_deref()).await?;
        }
        Commands::Rebalance { scenario, date, config } => {
            let date = parse_date(&date)?;
            cmd::rebalance::run(&scenario, date, config.as_deref()).await?;
        }
        Commands::Pipeline { scenario, date, config, out } => {
            let date = parse_date(&date)?;
            cmd::pipeline::run(&scenario, date, config.as_deref(), out.as_deref()).await?;
        }
    }

    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| anyhow::anyhow!("invalid date {s:?}: {e}"))
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
