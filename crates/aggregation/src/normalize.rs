//! Canonical fact table: raw records after unit conversion and calendar
//! derivation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use trade_stats_core::{IngestConfig, TradeFlow, TradeRecord, TradeSource};
use trade_stats_data::Dimension;

use crate::calendar::{self, CalendarFields};
use crate::units::UnitConverter;

/// One row of the canonical fact table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactRow {
    pub trade_flow: TradeFlow,
    pub date: NaiveDate,
    pub calendar: CalendarFields,
    pub commodity_id: Option<i32>,
    pub country_id: Option<i32>,
    pub naics_id: Option<i32>,
    pub district_id: Option<i32>,
    pub amount: Decimal,
    /// Sum of both quantity pairs in kilogram-equivalents
    pub qty: Decimal,
}

impl FactRow {
    /// Foreign key for a dimension; `None` for `Total` and unresolved ids.
    #[must_use]
    pub const fn dimension_id(&self, dimension: Dimension) -> Option<i32> {
        match dimension {
            Dimension::Total => None,
            Dimension::Commodity => self.commodity_id,
            Dimension::Naics => self.naics_id,
            Dimension::Country => self.country_id,
            Dimension::District => self.district_id,
        }
    }

    #[must_use]
    pub const fn is_import(&self) -> bool {
        matches!(self.trade_flow, TradeFlow::Import)
    }
}

/// Fact rows of a single source feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactTable {
    pub source: TradeSource,
    pub rows: Vec<FactRow>,
}

impl FactTable {
    #[must_use]
    pub const fn new(source: TradeSource, rows: Vec<FactRow>) -> Self {
        Self { source, rows }
    }

    /// Converts raw records into fact rows.
    ///
    /// Rows with a negative canonical quantity are always dropped. Rows with
    /// a zero canonical quantity are dropped when
    /// `ingest.exclude_zero_quantity` is set.
    #[must_use]
    pub fn from_records(
        source: TradeSource,
        records: &[TradeRecord],
        converter: &UnitConverter,
        ingest: &IngestConfig,
    ) -> Self {
        let mut rows = Vec::with_capacity(records.len());
        let mut unknown_units = BTreeSet::new();
        let mut zero_qty = 0usize;
        let mut negative_qty = 0usize;

        for record in records {
            unknown_units.extend(converter.unknown_units(record).map(str::to_lowercase));

            let qty = converter.canonical_quantity(record);
            if qty.is_sign_negative() && !qty.is_zero() {
                negative_qty += 1;
                continue;
            }
            if qty.is_zero() && ingest.exclude_zero_quantity {
                zero_qty += 1;
                continue;
            }

            rows.push(FactRow {
                trade_flow: record.trade_flow,
                date: record.date,
                calendar: calendar::derive(record.date),
                commodity_id: record.commodity_id,
                country_id: record.country_id,
                naics_id: record.naics_id,
                district_id: record.district_id,
                amount: record.amount,
                qty,
            });
        }

        if !unknown_units.is_empty() {
            warn!(
                units = ?unknown_units,
                "Unrecognized unit codes, quantities passed through unconverted"
            );
        }
        if zero_qty > 0 {
            warn!(
                rows = zero_qty,
                "Dropped rows with zero canonical quantity"
            );
        }
        if negative_qty > 0 {
            warn!(
                rows = negative_qty,
                "Dropped rows with negative canonical quantity"
            );
        }
        debug!(
            source = %source,
            input = records.len(),
            kept = rows.len(),
            "Built fact table"
        );

        Self { source, rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps only rows matching the predicate.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(&FactRow) -> bool) -> Self {
        Self {
            source: self.source,
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trade_stats_core::UnitConfig;

    fn converter() -> UnitConverter {
        UnitConverter::from_config(&UnitConfig::default()).unwrap()
    }

    fn record(flow: TradeFlow, qty: Decimal, unit: &str) -> TradeRecord {
        TradeRecord::new(flow, NaiveDate::from_ymd_opt(2020, 7, 9).unwrap(), dec!(10))
            .with_commodity(1)
            .with_quantity(qty, unit)
    }

    #[test]
    fn test_rows_carry_calendar_and_canonical_qty() {
        let records = vec![record(TradeFlow::Import, dec!(2), "t")];
        let table = FactTable::from_records(
            TradeSource::Institute,
            &records,
            &converter(),
            &IngestConfig::default(),
        );

        assert_eq!(table.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.qty, dec!(1814.37));
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2020, 7, 1).unwrap());
        assert_eq!(row.calendar.fiscal_year, 2021);
        assert_eq!(row.calendar.quarter, 3);
        assert_eq!(row.dimension_id(Dimension::Commodity), Some(1));
        assert_eq!(row.dimension_id(Dimension::Total), None);
    }

    #[test]
    fn test_zero_quantity_excluded_by_default() {
        let records = vec![
            record(TradeFlow::Import, dec!(0), "kg"),
            record(TradeFlow::Export, dec!(5), "kg"),
        ];
        let table = FactTable::from_records(
            TradeSource::Institute,
            &records,
            &converter(),
            &IngestConfig::default(),
        );
        assert_eq!(table.len(), 1);
        assert!(!table.rows[0].is_import());
    }

    #[test]
    fn test_zero_quantity_kept_when_configured() {
        let records = vec![record(TradeFlow::Import, dec!(0), "kg")];
        let ingest = IngestConfig {
            exclude_zero_quantity: false,
        };
        let table =
            FactTable::from_records(TradeSource::Institute, &records, &converter(), &ingest);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_negative_quantity_always_dropped() {
        let records = vec![record(TradeFlow::Import, dec!(-3), "kg")];
        let ingest = IngestConfig {
            exclude_zero_quantity: false,
        };
        let table =
            FactTable::from_records(TradeSource::Institute, &records, &converter(), &ingest);
        assert!(table.is_empty());
    }

    #[test]
    fn test_unresolved_ids_preserved() {
        let records = vec![TradeRecord::new(
            TradeFlow::Export,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            dec!(1),
        )
        .with_quantity(dec!(1), "kg")];
        let table = FactTable::from_records(
            TradeSource::PlanningBoard,
            &records,
            &converter(),
            &IngestConfig::default(),
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].commodity_id, None);
    }
}
