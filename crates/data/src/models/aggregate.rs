//! Aggregated fact table models.
//!
//! One `AggregatedRow` per grouping key: imports and exports reconciled side
//! by side with the derived net columns. The exact output column projection
//! depends on the `(TimeGranularity, Dimension)` pair that produced the table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::dimension::DimensionKind;

/// Time columns a table is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGranularity {
    Yearly,
    Fiscal,
    Quarterly,
    Monthly,
}

impl TimeGranularity {
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Yearly, Self::Fiscal, Self::Quarterly, Self::Monthly]
    }

    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Yearly => &["year"],
            Self::Fiscal => &["fiscal_year"],
            Self::Quarterly => &["year", "quarter"],
            Self::Monthly => &["year", "month"],
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yearly => "yearly",
            Self::Fiscal => "fiscal",
            Self::Quarterly => "quarterly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for TimeGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification a table is grouped by in addition to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Total,
    Commodity,
    Naics,
    Country,
    District,
}

impl Dimension {
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Total,
            Self::Commodity,
            Self::Naics,
            Self::Country,
            Self::District,
        ]
    }

    /// Lookup table joined for labels; `None` for `Total`.
    #[must_use]
    pub const fn lookup(self) -> Option<DimensionKind> {
        match self {
            Self::Total => None,
            Self::Commodity => Some(DimensionKind::Commodity),
            Self::Naics => Some(DimensionKind::Naics),
            Self::Country => Some(DimensionKind::Country),
            Self::District => Some(DimensionKind::District),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Commodity => "commodity",
            Self::Naics => "naics",
            Self::Country => "country",
            Self::District => "district",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value columns present in every aggregated table, in output order.
pub const VALUE_COLUMNS: [&str; 6] = [
    "imports",
    "exports",
    "qty_imports",
    "qty_exports",
    "net_exports",
    "net_qty",
];

/// Time part of a grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "granularity", rename_all = "lowercase")]
pub enum PeriodKey {
    Yearly { year: i32 },
    Fiscal { fiscal_year: i32 },
    Quarterly { year: i32, quarter: u32 },
    Monthly { year: i32, month: u32 },
}

impl PeriodKey {
    #[must_use]
    pub const fn granularity(&self) -> TimeGranularity {
        match self {
            Self::Yearly { .. } => TimeGranularity::Yearly,
            Self::Fiscal { .. } => TimeGranularity::Fiscal,
            Self::Quarterly { .. } => TimeGranularity::Quarterly,
            Self::Monthly { .. } => TimeGranularity::Monthly,
        }
    }

    #[must_use]
    pub const fn year(&self) -> Option<i32> {
        match self {
            Self::Yearly { year } | Self::Quarterly { year, .. } | Self::Monthly { year, .. } => {
                Some(*year)
            }
            Self::Fiscal { .. } => None,
        }
    }

    #[must_use]
    pub const fn fiscal_year(&self) -> Option<i32> {
        match self {
            Self::Fiscal { fiscal_year } => Some(*fiscal_year),
            _ => None,
        }
    }

    #[must_use]
    pub const fn quarter(&self) -> Option<u32> {
        match self {
            Self::Quarterly { quarter, .. } => Some(*quarter),
            _ => None,
        }
    }

    #[must_use]
    pub const fn month(&self) -> Option<u32> {
        match self {
            Self::Monthly { month, .. } => Some(*month),
            _ => None,
        }
    }
}

/// Dimension id plus the label attached from its lookup table.
///
/// `id` is `None` for records whose foreign key was never resolved;
/// `code` is `None` when the id has no match in the lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionLabel {
    pub kind: DimensionKind,
    pub id: Option<i32>,
    pub code: Option<String>,
    pub description: Option<String>,
}

impl DimensionLabel {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.code.is_some()
    }
}

/// Typed cell used by the table writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Int(Option<i64>),
    Text(Option<String>),
    Amount(Decimal),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(Some(v)) => write!(f, "{v}"),
            Self::Text(Some(v)) => f.write_str(v),
            Self::Int(None) | Self::Text(None) => Ok(()),
            Self::Amount(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub period: PeriodKey,
    pub dimension: Option<DimensionLabel>,
    pub imports: Decimal,
    pub exports: Decimal,
    pub qty_imports: Decimal,
    pub qty_exports: Decimal,
    pub net_exports: Decimal,
    pub net_qty: Decimal,
}

impl AggregatedRow {
    #[must_use]
    pub fn dimension_id(&self) -> Option<i32> {
        self.dimension.as_ref().and_then(|d| d.id)
    }

    #[must_use]
    pub fn dimension_code(&self) -> Option<&str> {
        self.dimension.as_ref().and_then(|d| d.code.as_deref())
    }

    /// Returns the value of an output column, or `None` if the row has no
    /// such column.
    #[must_use]
    pub fn cell(&self, column: &str) -> Option<Cell> {
        let int = |v: Option<i64>| Some(Cell::Int(v));
        match column {
            "year" => int(self.period.year().map(i64::from)),
            "fiscal_year" => int(self.period.fiscal_year().map(i64::from)),
            "quarter" => int(self.period.quarter().map(i64::from)),
            "month" => int(self.period.month().map(i64::from)),
            "imports" => Some(Cell::Amount(self.imports)),
            "exports" => Some(Cell::Amount(self.exports)),
            "qty_imports" => Some(Cell::Amount(self.qty_imports)),
            "qty_exports" => Some(Cell::Amount(self.qty_exports)),
            "net_exports" => Some(Cell::Amount(self.net_exports)),
            "net_qty" => Some(Cell::Amount(self.net_qty)),
            other => {
                let label = self.dimension.as_ref()?;
                if other == label.kind.id_column() {
                    int(label.id.map(i64::from))
                } else if other == label.kind.code_column() {
                    Some(Cell::Text(label.code.clone()))
                } else if Some(other) == label.kind.description_column() {
                    Some(Cell::Text(label.description.clone()))
                } else {
                    None
                }
            }
        }
    }
}

/// Engine output: rows plus the column projection of the selector that
/// produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedTable {
    pub granularity: TimeGranularity,
    pub dimension: Dimension,
    pub columns: Vec<String>,
    pub rows: Vec<AggregatedRow>,
}

impl AggregatedTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of `imports` over all rows.
    #[must_use]
    pub fn total_imports(&self) -> Decimal {
        self.rows.iter().map(|r| r.imports).sum()
    }

    /// Sum of `exports` over all rows.
    #[must_use]
    pub fn total_exports(&self) -> Decimal {
        self.rows.iter().map(|r| r.exports).sum()
    }

    /// Rows whose dimension id is set but missing from the lookup table.
    pub fn unresolved_rows(&self) -> impl Iterator<Item = &AggregatedRow> {
        self.rows.iter().filter(|r| {
            r.dimension
                .as_ref()
                .is_some_and(|d| d.id.is_some() && !d.is_resolved())
        })
    }
}
