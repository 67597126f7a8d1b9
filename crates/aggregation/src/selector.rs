//! Selector parsing and the `(granularity, dimension)` dispatch table.
//!
//! Each selector pair maps to one [`AggregationDescriptor`] holding the
//! grouping columns, the lookup table to join and the output projection.
//! One generic aggregation routine runs off the descriptor.

use serde::{Deserialize, Serialize};
use std::fmt;
use trade_stats_core::TradeSource;
use trade_stats_data::{Dimension, DimensionKind, TimeGranularity, VALUE_COLUMNS};

use crate::error::{AggregationError, Result};

/// A validated `(granularity, dimension)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub granularity: TimeGranularity,
    pub dimension: Dimension,
}

impl Selector {
    #[must_use]
    pub const fn new(granularity: TimeGranularity, dimension: Dimension) -> Self {
        Self {
            granularity,
            dimension,
        }
    }

    /// Parses a selector from user-facing names.
    ///
    /// Granularity: `yearly`, `fiscal`, `quarterly` or `qrt`, `monthly`.
    /// Dimension: `total`, `commodity` or `hts`, `naics`, `country`,
    /// `district`. Matching is case-insensitive; anything else is rejected.
    pub fn parse(granularity: &str, dimension: &str) -> Result<Self> {
        let invalid = || AggregationError::InvalidSelector {
            granularity: granularity.to_string(),
            dimension: dimension.to_string(),
        };
        let g = parse_granularity(granularity).ok_or_else(invalid)?;
        let d = parse_dimension(dimension).ok_or_else(invalid)?;
        Ok(Self::new(g, d))
    }

    /// Fails if the source feed has no classification for the dimension.
    pub fn validate_for(&self, source: TradeSource) -> Result<()> {
        let supported = match self.dimension {
            Dimension::Naics => source.has_naics(),
            Dimension::District => source.has_district(),
            Dimension::Total | Dimension::Commodity | Dimension::Country => true,
        };
        if supported {
            Ok(())
        } else {
            Err(AggregationError::UnsupportedDimension {
                dimension: self.dimension,
                trade_source: source,
            })
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> AggregationDescriptor {
        AggregationDescriptor::new(*self)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.granularity, self.dimension)
    }
}

fn parse_granularity(value: &str) -> Option<TimeGranularity> {
    match value.trim().to_lowercase().as_str() {
        "yearly" => Some(TimeGranularity::Yearly),
        "fiscal" => Some(TimeGranularity::Fiscal),
        "quarterly" | "qrt" => Some(TimeGranularity::Quarterly),
        "monthly" => Some(TimeGranularity::Monthly),
        _ => None,
    }
}

fn parse_dimension(value: &str) -> Option<Dimension> {
    match value.trim().to_lowercase().as_str() {
        "total" => Some(Dimension::Total),
        "commodity" | "hts" => Some(Dimension::Commodity),
        "naics" => Some(Dimension::Naics),
        "country" => Some(Dimension::Country),
        "district" => Some(Dimension::District),
        _ => None,
    }
}

/// Grouping and projection for one selector pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationDescriptor {
    pub selector: Selector,
    /// Time columns followed by the dimension id column, if any
    pub group_columns: Vec<&'static str>,
    /// Lookup table joined for labels
    pub lookup: Option<DimensionKind>,
    /// Columns taken from the lookup table
    pub label_columns: Vec<&'static str>,
}

impl AggregationDescriptor {
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        let lookup = selector.dimension.lookup();
        let mut group_columns = selector.granularity.columns().to_vec();
        let mut label_columns = Vec::new();
        if let Some(kind) = lookup {
            group_columns.push(kind.id_column());
            label_columns.push(kind.code_column());
            label_columns.extend(kind.description_column());
        }
        Self {
            selector,
            group_columns,
            lookup,
            label_columns,
        }
    }

    /// Output column order: grouping columns, labels, then value columns.
    #[must_use]
    pub fn output_columns(&self) -> Vec<String> {
        self.group_columns
            .iter()
            .chain(&self.label_columns)
            .chain(VALUE_COLUMNS.iter())
            .map(|c| (*c).to_string())
            .collect()
    }
}

/// Every supported selector pair with its descriptor.
#[must_use]
pub fn dispatch_table() -> Vec<AggregationDescriptor> {
    TimeGranularity::all()
        .into_iter()
        .flat_map(|g| {
            Dimension::all()
                .into_iter()
                .map(move |d| Selector::new(g, d).descriptor())
        })
        .collect()
}
