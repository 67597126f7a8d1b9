//! Unit-price and rank view over the monthly-by-commodity aggregate.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{info, warn};
use trade_stats_data::{AggregatedTable, Dimension, PeriodKey, PriceRow, TimeGranularity};

use crate::error::{AggregationError, Result};

/// Months before the current one included in the moving average.
pub const MOVING_WINDOW_MONTHS: u32 = 2;

/// Rows back within a commodity group for the year-over-year comparison.
pub const YEAR_LAG_ROWS: usize = 12;

/// Length of the commodity group prefix.
pub const HS4_LEN: usize = 4;

#[derive(Default)]
struct Sums {
    imports: Decimal,
    exports: Decimal,
    qty_imports: Decimal,
    qty_exports: Decimal,
}

/// Builds the price view from a monthly commodity aggregate.
///
/// Zero quantities are replaced by 1 before summation so every price is
/// defined. Rows without a commodity code are skipped.
///
/// # Errors
/// `DataValidation` if the table is not monthly by commodity or a price
/// overflows.
pub fn price_view(table: &AggregatedTable) -> Result<Vec<PriceRow>> {
    if table.granularity != TimeGranularity::Monthly || table.dimension != Dimension::Commodity {
        return Err(AggregationError::DataValidation(format!(
            "price view needs a monthly commodity table, got {}/{}",
            table.granularity, table.dimension
        )));
    }

    let mut groups: BTreeMap<(String, NaiveDate), Sums> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in &table.rows {
        let (PeriodKey::Monthly { year, month }, Some(code)) = (row.period, row.dimension_code())
        else {
            skipped += 1;
            continue;
        };
        let (Some(hs4), Some(date)) = (code.get(..HS4_LEN), NaiveDate::from_ymd_opt(year, month, 1))
        else {
            skipped += 1;
            continue;
        };

        let sums = groups.entry((hs4.to_string(), date)).or_default();
        sums.imports += row.imports;
        sums.exports += row.exports;
        sums.qty_imports += substitute_zero(row.qty_imports);
        sums.qty_exports += substitute_zero(row.qty_exports);
    }
    if skipped > 0 {
        warn!(rows = skipped, "Skipped rows without a usable commodity code");
    }

    let mut rows = Vec::with_capacity(groups.len());
    for ((hs4, date), sums) in groups {
        rows.push(PriceRow {
            date,
            hs4,
            price_imports: divide(sums.imports, sums.qty_imports)?,
            price_exports: divide(sums.exports, sums.qty_exports)?,
            imports: sums.imports,
            exports: sums.exports,
            qty_imports: sums.qty_imports,
            qty_exports: sums.qty_exports,
            moving_price_imports: Decimal::ZERO,
            moving_price_exports: Decimal::ZERO,
            prev_year_imports: None,
            prev_year_exports: None,
            pct_change_imports: None,
            pct_change_exports: None,
            moving_import_rank: None,
            moving_export_rank: None,
            pct_imports_rank: None,
            pct_exports_rank: None,
        });
    }

    // rows are ordered by (hs4, date) here
    apply_group_windows(&mut rows);
    apply_ranks(&mut rows);
    rows.sort_by(|a, b| (a.date, &a.hs4).cmp(&(b.date, &b.hs4)));

    info!(groups = rows.len(), "Built price view");
    Ok(rows)
}

fn substitute_zero(qty: Decimal) -> Decimal {
    if qty.is_zero() {
        Decimal::ONE
    } else {
        qty
    }
}

fn divide(amount: Decimal, qty: Decimal) -> Result<Decimal> {
    amount.checked_div(qty).ok_or_else(|| {
        AggregationError::DataValidation(format!("price overflow: {amount} / {qty}"))
    })
}

/// Moving average, year lag and pct change within each hs4 group.
fn apply_group_windows(rows: &mut [PriceRow]) {
    let mut start = 0;
    while start < rows.len() {
        let end = rows[start..]
            .iter()
            .position(|r| r.hs4 != rows[start].hs4)
            .map_or(rows.len(), |offset| start + offset);
        let group = &mut rows[start..end];

        for i in 0..group.len() {
            let window_start = group[i]
                .date
                .checked_sub_months(Months::new(MOVING_WINDOW_MONTHS))
                .unwrap_or(NaiveDate::MIN);
            // one row per month, so only the trailing rows can fall inside
            let first = i.saturating_sub(MOVING_WINDOW_MONTHS as usize);
            let window: Vec<&PriceRow> = group[first..=i]
                .iter()
                .filter(|r| r.date >= window_start)
                .collect();
            let count = Decimal::from(window.len());
            let imports: Decimal = window.iter().map(|r| r.price_imports).sum();
            let exports: Decimal = window.iter().map(|r| r.price_exports).sum();
            group[i].moving_price_imports = imports / count;
            group[i].moving_price_exports = exports / count;
        }

        for i in YEAR_LAG_ROWS..group.len() {
            let prev_imports = group[i - YEAR_LAG_ROWS].moving_price_imports;
            let prev_exports = group[i - YEAR_LAG_ROWS].moving_price_exports;
            let row = &mut group[i];
            row.prev_year_imports = Some(prev_imports);
            row.prev_year_exports = Some(prev_exports);
            row.pct_change_imports = pct_change(row.moving_price_imports, prev_imports);
            row.pct_change_exports = pct_change(row.moving_price_exports, prev_exports);
        }

        start = end;
    }
}

fn pct_change(current: Decimal, previous: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    (current - previous).checked_div(previous)
}

/// Dense ranks per date, ascending. Null values get a null rank.
fn apply_ranks(rows: &mut [PriceRow]) {
    let mut by_date: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        by_date.entry(row.date).or_default().push(i);
    }

    for indices in by_date.values() {
        let values = |f: fn(&PriceRow) -> Option<Decimal>| -> Vec<Option<Decimal>> {
            indices.iter().map(|&i| f(&rows[i])).collect()
        };
        let moving_imports = dense_rank(&values(|r| Some(r.moving_price_imports)));
        let moving_exports = dense_rank(&values(|r| Some(r.moving_price_exports)));
        let pct_imports = dense_rank(&values(|r| r.pct_change_imports));
        let pct_exports = dense_rank(&values(|r| r.pct_change_exports));

        for (k, &i) in indices.iter().enumerate() {
            rows[i].moving_import_rank = moving_imports[k];
            rows[i].moving_export_rank = moving_exports[k];
            rows[i].pct_imports_rank = pct_imports[k];
            rows[i].pct_exports_rank = pct_exports[k];
        }
    }
}

/// 1-based dense rank; ties share a rank and leave no gaps.
#[must_use]
pub fn dense_rank(values: &[Option<Decimal>]) -> Vec<Option<u32>> {
    let mut distinct: Vec<Decimal> = values.iter().flatten().copied().collect();
    distinct.sort();
    distinct.dedup();

    values
        .iter()
        .map(|value| {
            let value = value.as_ref()?;
            let position = distinct.binary_search(value).ok()?;
            u32::try_from(position + 1).ok()
        })
        .collect()
}
