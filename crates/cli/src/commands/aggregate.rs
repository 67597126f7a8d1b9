//! Aggregate command.
//!
//! Aggregates a trade extract by one `(granularity, dimension)` selector, or
//! by every selector the source supports, and writes CSV or Parquet tables.
//!
//! # Usage
//!
//! ```bash
//! trade-stats aggregate -i data/raw/org.csv -t monthly -d hts --filter 0101
//! trade-stats aggregate -i data/raw/jp.csv --source planning_board --all --format parquet
//! ```

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use trade_stats_aggregation::{dispatch_table, Selector};
use trade_stats_data::{AggregatedTable, CsvStorage, ParquetStorage};

use super::context::{build_aggregator, FilterArgs, InputArgs};

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// Arguments for the aggregate command.
#[derive(Args, Debug, Clone)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Time granularity: yearly, fiscal, quarterly (qrt) or monthly
    #[arg(short = 't', long, default_value = "monthly")]
    pub time_granularity: String,

    /// Dimension: total, commodity (hts), naics, country or district
    #[arg(short, long, default_value = "total")]
    pub dimension: String,

    /// Run every selector supported by the source (a prefix filter only
    /// resolves against one dimension, so --filter is not accepted here)
    #[arg(long, conflicts_with_all = ["time_granularity", "dimension", "filter"])]
    pub all: bool,

    /// Group by the external classification hierarchy
    #[arg(long)]
    pub group_by_hierarchy: bool,

    #[arg(long, value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Output file; a directory when --all is set (default: output.directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Runs the aggregate command.
///
/// # Errors
/// Returns an error if loading, validation, aggregation or writing fails.
pub fn run_aggregate(args: AggregateArgs) -> Result<()> {
    let (config, aggregator) = build_aggregator(&args.input)?;
    let source = args.input.source;

    let selectors: Vec<Selector> = if args.all {
        dispatch_table()
            .into_iter()
            .map(|d| d.selector)
            .filter(|s| s.validate_for(source).is_ok())
            .collect()
    } else {
        vec![Selector::parse(&args.time_granularity, &args.dimension)?]
    };

    let facts = aggregator.fact_table()?;
    tracing::info!(source = %source, facts = facts.len(), "Loaded extract");

    for selector in selectors {
        let request = args
            .filters
            .request(selector)
            .with_group_by_hierarchy(args.group_by_hierarchy);
        let table = aggregator.run_on(&facts, &request)?;

        let default_name = || {
            format!(
                "{source}_{}_{}.{}",
                selector.granularity,
                selector.dimension,
                args.format.extension()
            )
        };
        let path = match (&args.output, args.all) {
            (Some(path), false) => path.clone(),
            (Some(dir), true) => dir.join(default_name()),
            (None, _) => config.output.directory.join(default_name()),
        };
        write_table(&path, &table, args.format)?;
    }

    Ok(())
}

fn write_table(path: &Path, table: &AggregatedTable, format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    match format {
        OutputFormat::Csv => CsvStorage::write_aggregated(path, table)?,
        OutputFormat::Parquet => ParquetStorage::write_aggregated(path, table)?,
    }

    let unresolved = table.unresolved_rows().count();
    tracing::info!(
        path = %path.display(),
        rows = table.len(),
        unresolved,
        "Wrote {}/{} table",
        table.granularity,
        table.dimension
    );
    println!("{} rows -> {}", table.len(), path.display());
    Ok(())
}
