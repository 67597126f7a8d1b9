//! Core types, configuration, and collaborator traits for trade statistics.
//!
//! This crate provides:
//! - Raw trade records and the trade-flow / source enums
//! - Layered application configuration (unit table, agriculture gate, paths)
//! - The `TradeDataSource` seam the ingestion side implements

pub mod config;
pub mod config_loader;
pub mod records;
pub mod traits;

pub use config::{
    AgricultureConfig, AppConfig, FactorOp, IngestConfig, OutputConfig, ReferenceConfig,
    UnitConfig, UnitFactor,
};
pub use config_loader::ConfigLoader;
pub use records::{first_of_month, TradeFlow, TradeRecord, TradeSource};
pub use traits::TradeDataSource;
