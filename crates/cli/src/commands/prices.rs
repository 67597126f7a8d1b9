//! Prices command.
//!
//! Builds the monthly unit-price and rank view per 4-digit commodity group.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use trade_stats_aggregation::{price_view, Selector};
use trade_stats_data::{CsvStorage, Dimension, TimeGranularity};

use super::context::{build_aggregator, FilterArgs, InputArgs};

/// Arguments for the prices command.
#[derive(Args, Debug, Clone)]
pub struct PricesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Output CSV (default: <output.directory>/<source>_prices.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Runs the prices command.
///
/// # Errors
/// Returns an error if loading, aggregation or writing fails.
pub fn run_prices(args: PricesArgs) -> Result<()> {
    let (config, aggregator) = build_aggregator(&args.input)?;

    let selector = Selector::new(TimeGranularity::Monthly, Dimension::Commodity);
    let table = aggregator.run(&args.filters.request(selector))?;
    let rows = price_view(&table)?;

    let path = args.output.unwrap_or_else(|| {
        config
            .output
            .directory
            .join(format!("{}_prices.csv", args.input.source))
    });
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    CsvStorage::write_prices(&path, &rows)?;

    tracing::info!(path = %path.display(), rows = rows.len(), "Wrote price view");
    println!("{} rows -> {}", rows.len(), path.display());
    Ok(())
}
