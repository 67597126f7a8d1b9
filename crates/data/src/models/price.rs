//! Monthly unit-price view per 4-digit commodity group.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One `(date, hs4)` cell of the price view.
///
/// Quantities here are post-substitution: a zero quantity was replaced by 1
/// before summation, so prices are always defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub hs4: String,
    pub imports: Decimal,
    pub exports: Decimal,
    pub qty_imports: Decimal,
    pub qty_exports: Decimal,
    pub price_imports: Decimal,
    pub price_exports: Decimal,
    pub moving_price_imports: Decimal,
    pub moving_price_exports: Decimal,
    pub prev_year_imports: Option<Decimal>,
    pub prev_year_exports: Option<Decimal>,
    pub pct_change_imports: Option<Decimal>,
    pub pct_change_exports: Option<Decimal>,
    pub moving_import_rank: Option<u32>,
    pub moving_export_rank: Option<u32>,
    pub pct_imports_rank: Option<u32>,
    pub pct_exports_rank: Option<u32>,
}

impl PriceRow {
    /// Column order used by the CSV writer.
    pub const COLUMNS: [&'static str; 18] = [
        "date",
        "hs4",
        "imports",
        "exports",
        "qty_imports",
        "qty_exports",
        "price_imports",
        "price_exports",
        "moving_price_imports",
        "moving_price_exports",
        "prev_year_imports",
        "prev_year_exports",
        "pct_change_imports",
        "pct_change_exports",
        "moving_import_rank",
        "moving_export_rank",
        "pct_imports_rank",
        "pct_exports_rank",
    ];

    /// Renders the row in `COLUMNS` order; nulls become empty strings.
    #[must_use]
    pub fn to_record(&self) -> Vec<String> {
        fn opt<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        vec![
            self.date.format("%Y-%m-%d").to_string(),
            self.hs4.clone(),
            self.imports.to_string(),
            self.exports.to_string(),
            self.qty_imports.to_string(),
            self.qty_exports.to_string(),
            self.price_imports.round_dp(4).to_string(),
            self.price_exports.round_dp(4).to_string(),
            self.moving_price_imports.round_dp(4).to_string(),
            self.moving_price_exports.round_dp(4).to_string(),
            opt(self.prev_year_imports.map(|v| v.round_dp(4))),
            opt(self.prev_year_exports.map(|v| v.round_dp(4))),
            opt(self.pct_change_imports.map(|v| v.round_dp(6))),
            opt(self.pct_change_exports.map(|v| v.round_dp(6))),
            opt(self.moving_import_rank),
            opt(self.moving_export_rank),
            opt(self.pct_imports_rank),
            opt(self.pct_exports_rank),
        ]
    }
}
