//! Data models for trade statistics aggregation.
//!
//! Amounts and quantities use `rust_decimal::Decimal` so sums and net
//! columns are exact.

pub mod aggregate;
pub mod dimension;
pub mod price;

pub use aggregate::{
    AggregatedRow, AggregatedTable, Cell, Dimension, DimensionLabel, PeriodKey, TimeGranularity,
    VALUE_COLUMNS,
};
pub use dimension::{DimensionEntry, DimensionKind, DimensionTable, ReferenceData};
pub use price::PriceRow;
