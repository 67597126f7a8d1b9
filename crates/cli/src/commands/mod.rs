//! CLI commands for trade statistics aggregation.

pub mod aggregate;
pub mod context;
pub mod prices;
pub mod units;

pub use aggregate::{run_aggregate, AggregateArgs};
pub use prices::{run_prices, PricesArgs};
pub use units::{run_units, UnitsArgs};
