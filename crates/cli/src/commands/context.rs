//! Shared setup for commands: configuration, reference data and the
//! aggregator over a CSV extract.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use trade_stats_aggregation::{
    AggregationRequest, AgricultureFilter, Selector, TimeWindow, TradeAggregator, UnitConverter,
};
use trade_stats_core::{AppConfig, ConfigLoader, TradeSource};
use trade_stats_data::{load_agriculture_codes, load_reference_data, CsvTradeSource};

/// Arguments locating the extract, lookup tables and configuration.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Source feed of the extract: institute or planning_board
    #[arg(long, default_value = "institute", value_parser = parse_source)]
    pub source: TradeSource,

    /// Trade extract CSV (trade_flow,date,...,qty_2,unit_2)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Config file layered over the defaults (default: config/Config.toml)
    #[arg(short, long, env = "TRADE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory with the <kind>.csv lookup tables
    #[arg(long)]
    pub reference_dir: Option<PathBuf>,
}

/// Filters applied before aggregation.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Code prefix matched against the dimension's lookup table
    #[arg(long)]
    pub filter: Option<String>,

    /// Keep agricultural commodities only
    #[arg(long)]
    pub agr: bool,

    /// Time window: "2020" or "<start>+<end>" (dates or bare years)
    #[arg(long, value_parser = parse_time_window)]
    pub time: Option<TimeWindow>,
}

impl FilterArgs {
    pub fn request(&self, selector: Selector) -> AggregationRequest {
        let mut request = AggregationRequest::new(selector).with_agriculture_only(self.agr);
        if let Some(prefix) = &self.filter {
            request = request.with_filter(prefix.clone());
        }
        if let Some(window) = self.time {
            request = request.with_time(window);
        }
        request
    }
}

fn parse_source(value: &str) -> Result<TradeSource, String> {
    value.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_time_window(value: &str) -> Result<TimeWindow, String> {
    value.parse().map_err(|e: trade_stats_aggregation::AggregationError| e.to_string())
}

/// Loads configuration from `path`, or the default layered sources.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => ConfigLoader::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => ConfigLoader::load().context("Failed to load config"),
    }
}

/// Builds the aggregator for one extract.
pub fn build_aggregator(input: &InputArgs) -> Result<(AppConfig, TradeAggregator<CsvTradeSource>)> {
    let config = load_config(input.config.as_deref())?;

    let reference_dir = input
        .reference_dir
        .clone()
        .unwrap_or_else(|| config.reference.directory.clone());
    let reference = load_reference_data(&reference_dir).with_context(|| {
        format!("Failed to load lookup tables from {}", reference_dir.display())
    })?;
    tracing::info!(
        dir = %reference_dir.display(),
        tables = reference.kinds().len(),
        "Loaded reference data"
    );

    let extra_codes = match &config.agriculture.codes_file {
        Some(path) => load_agriculture_codes(path)?,
        None => Default::default(),
    };
    let agriculture = AgricultureFilter::new(&config.agriculture, extra_codes);
    let converter = UnitConverter::from_config(&config.units)?;

    let source = CsvTradeSource::new(input.source, &input.input);
    let aggregator = TradeAggregator::new(source, reference, converter)
        .with_ingest(config.ingest.clone())
        .with_agriculture(agriculture);

    Ok((config, aggregator))
}
