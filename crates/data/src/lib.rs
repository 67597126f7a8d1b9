//! Data models and file storage for trade statistics aggregation.
//!
//! This crate provides:
//! - Models for classification tables, aggregated tables and price views
//! - CSV readers for trade extracts and lookup tables
//! - CSV and Parquet writers for engine output
//! - `TradeDataSource` implementations over CSV files and memory

pub mod csv_storage;
pub mod models;
pub mod parquet_storage;
pub mod reference_files;
pub mod sources;

// Re-export commonly used types
pub use csv_storage::{parse_month_date, CsvStorage};
pub use parquet_storage::ParquetStorage;
pub use reference_files::{clean_code, load_agriculture_codes, load_reference_data, pad_code};
pub use sources::{CsvTradeSource, InMemoryTradeSource};

// Re-export models
pub use models::{
    AggregatedRow, AggregatedTable, Cell, Dimension, DimensionEntry, DimensionKind,
    DimensionLabel, DimensionTable, PeriodKey, PriceRow, ReferenceData, TimeGranularity,
    VALUE_COLUMNS,
};
