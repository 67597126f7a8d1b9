use clap::{Parser, Subcommand};

mod commands;

use commands::{AggregateArgs, PricesArgs, UnitsArgs};

#[derive(Parser)]
#[command(name = "trade-stats")]
#[command(about = "Normalize and re-aggregate international trade statistics", long_about = None)]
struct Cli {
    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a trade extract by time granularity and dimension
    Aggregate(AggregateArgs),
    /// Build the monthly unit-price view per 4-digit commodity group
    Prices(PricesArgs),
    /// Show the unit conversion table in force
    Units(UnitsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    match cli.command {
        Commands::Aggregate(args) => commands::run_aggregate(args)?,
        Commands::Prices(args) => commands::run_prices(args)?,
        Commands::Units(args) => commands::run_units(args)?,
    }

    Ok(())
}
