//! Units command: prints the unit conversion table in force.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use trade_stats_aggregation::UnitConverter;
use trade_stats_core::FactorOp;

use super::context::load_config;

/// Arguments for the units command.
#[derive(Args, Debug, Clone)]
pub struct UnitsArgs {
    /// Config file layered over the defaults (default: config/Config.toml)
    #[arg(short, long, env = "TRADE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Runs the units command.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or is invalid.
pub fn run_units(args: UnitsArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    // validates divisors and logs disputed factors
    let converter = UnitConverter::from_config(&config.units)?;

    println!("{:<8} {:<4} {:>12}  NOTE", "UNIT", "OP", "FACTOR");
    for (code, factor) in converter.factors() {
        let op = match factor.op {
            FactorOp::Multiply => "x",
            FactorOp::Divide => "/",
        };
        let disputed = config
            .units
            .disputed
            .iter()
            .any(|d| d.eq_ignore_ascii_case(code));
        println!(
            "{:<8} {:<4} {:>12}  {}",
            code,
            op,
            factor.factor,
            if disputed { "disputed" } else { "" }
        );
    }
    println!("other    identity");
    Ok(())
}
