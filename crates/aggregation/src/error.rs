//! Error types for the aggregation engine.
//!
//! Every variant is fatal for the call that produced it. Unknown unit codes
//! are not errors; they convert with identity.

use thiserror::Error;
use trade_stats_core::TradeSource;
use trade_stats_data::Dimension;

/// Errors raised while validating or running an aggregation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregationError {
    /// The `(granularity, dimension)` pair is not in the dispatch table.
    #[error("invalid selector: granularity '{granularity}', dimension '{dimension}'")]
    InvalidSelector {
        granularity: String,
        dimension: String,
    },

    /// The source feed carries no classification for the dimension.
    #[error("dimension '{dimension}' is not available for source '{trade_source}'")]
    UnsupportedDimension {
        dimension: Dimension,
        trade_source: TradeSource,
    },

    /// A code prefix filter matched nothing in the lookup table.
    #[error("no {dimension} code starts with '{prefix}'")]
    FilterNotFound { dimension: Dimension, prefix: String },

    /// A code prefix filter was given with the `total` dimension.
    #[error("filter '{prefix}' needs a classification dimension, got 'total'")]
    FilterWithoutDimension { prefix: String },

    /// Entry point for a feature that does not exist yet.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Time window argument could not be parsed.
    #[error("invalid time window: {0}")]
    InvalidTimeWindow(String),

    /// The injected data source failed to produce records.
    #[error("data source error: {0}")]
    Source(String),

    /// Input data violated an invariant.
    #[error("data validation error: {0}")]
    DataValidation(String),
}

/// Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregationError>;
